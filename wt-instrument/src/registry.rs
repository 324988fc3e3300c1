use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::{
    BaseDataError, ContractInfo, HhMm, HolidayCalendar, SessionInfo, YmdDate,
    exchange::{Code, Exchange, full_code},
};

/// Registry of [`ContractInfo`], [`SessionInfo`] and a [`HolidayCalendar`],
/// constructed once at engine init from base-data config and then
/// immutable for the process lifetime.
#[derive(Debug, Clone, Default)]
pub struct BaseDataRegistry {
    contracts: IndexMap<SmolStr, ContractInfo>,
    sessions: IndexMap<SmolStr, SessionInfo>,
    pub holidays: HolidayCalendar,
}

impl BaseDataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_contract(&mut self, contract: ContractInfo) {
        let key = full_code(&contract.exchange, &contract.code);
        self.contracts.insert(key, contract);
    }

    pub fn insert_session(&mut self, session: SessionInfo) {
        self.sessions.insert(session.id.clone(), session);
    }

    pub fn contract(&self, exchange: &Exchange, code: &Code) -> Result<&ContractInfo, BaseDataError> {
        let key = full_code(exchange, code);
        self.contracts
            .get(&key)
            .ok_or_else(|| BaseDataError::UnknownContract {
                exchange: exchange.0.clone(),
                code: code.0.clone(),
            })
    }

    pub fn contract_by_std_code(&self, std_code: &str) -> Result<&ContractInfo, BaseDataError> {
        self.contracts
            .get(std_code)
            .ok_or_else(|| BaseDataError::UnknownContract {
                exchange: SmolStr::new(""),
                code: SmolStr::new(std_code),
            })
    }

    pub fn session(&self, session_id: &str) -> Result<&SessionInfo, BaseDataError> {
        self.sessions
            .get(session_id)
            .ok_or_else(|| BaseDataError::UnknownSession(SmolStr::new(session_id)))
    }

    pub fn session_of(&self, contract: &ContractInfo) -> Result<&SessionInfo, BaseDataError> {
        self.session(&contract.session_id)
    }

    /// `calcTradingDate`: the trading day that wall-clock `(date, hhmm)`
    /// belongs to, given the contract's session and holiday template.
    ///
    /// - Pre-midnight part of a night section -> next business day after `date`.
    /// - Post-midnight part of a night section -> `date` itself (the
    ///   calendar already rolled over).
    /// - Otherwise -> `date` if a business day, else the next business day.
    pub fn calc_trading_date(
        &self,
        contract: &ContractInfo,
        date: YmdDate,
        hhmm: HhMm,
    ) -> Result<YmdDate, BaseDataError> {
        let session = self.session_of(contract)?;
        let template = contract.holiday_template.as_str();

        if session.is_premidnight_night_section(hhmm) {
            return self.holidays.next_business_day(template, date);
        }
        if session.is_postmidnight_night_section(hhmm) {
            return Ok(date);
        }
        if self.holidays.is_business_day(template, date)? {
            Ok(date)
        } else {
            self.holidays.next_business_day(template, date)
        }
    }

    pub fn next_trading_date(&self, contract: &ContractInfo, date: YmdDate) -> Result<YmdDate, BaseDataError> {
        self.holidays.next_business_day(contract.holiday_template.as_str(), date)
    }

    pub fn prev_trading_date(&self, contract: &ContractInfo, date: YmdDate) -> Result<YmdDate, BaseDataError> {
        self.holidays.prev_business_day(contract.holiday_template.as_str(), date)
    }
}
