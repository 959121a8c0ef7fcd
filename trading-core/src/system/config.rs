//! `TsConfig` — the configuration table of spec.md §4.1, plus the typed
//! `get_param`/`set_param` surface of spec.md §6.
//!
//! No file-based config layer: the teacher's `trendlab-core::engine::state::
//! EngineConfig` is a plain struct built by its host, not parsed from a
//! file (the teacher's `toml`/`clap` dependencies belonged to its CLI/runner
//! crates, out of this crate's scope). `TsConfig` follows the same shape.

use crate::error::ConfigError;

/// Per-bar state-machine configuration (spec.md §4.1 table). All fields
/// tunable; defaults match the table exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TsConfig {
    pub max_delay_count: u32,
    pub delay: bool,
    pub delay_use_current_price: bool,
    pub tp_monotonic: bool,
    pub tp_delay_n: u32,
    pub ignore_sell_sg: bool,
    pub can_trade_when_high_eq_low: bool,
    pub ev_open_position: bool,
    pub cn_open_position: bool,
    pub support_borrow_cash: bool,
    pub support_borrow_stock: bool,
}

impl Default for TsConfig {
    fn default() -> Self {
        Self {
            max_delay_count: 3,
            delay: true,
            delay_use_current_price: true,
            tp_monotonic: true,
            tp_delay_n: 3,
            ignore_sell_sg: false,
            can_trade_when_high_eq_low: false,
            ev_open_position: false,
            cn_open_position: false,
            support_borrow_cash: false,
            support_borrow_stock: false,
        }
    }
}

/// A typed parameter value, for the string-keyed `get_param`/`set_param`
/// surface (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(u32),
}

impl ParamValue {
    fn as_bool(self, name: &str) -> Result<bool, ConfigError> {
        match self {
            ParamValue::Bool(b) => Ok(b),
            ParamValue::Int(_) => Err(ConfigError::WrongValueType {
                name: name.to_string(),
                expected: "bool",
            }),
        }
    }

    fn as_int(self, name: &str) -> Result<u32, ConfigError> {
        match self {
            ParamValue::Int(i) => Ok(i),
            ParamValue::Bool(_) => Err(ConfigError::WrongValueType {
                name: name.to_string(),
                expected: "int",
            }),
        }
    }
}

impl TsConfig {
    /// Read a parameter by its table name (spec.md §6 `get_param`).
    pub fn get_param(&self, name: &str) -> Option<ParamValue> {
        Some(match name {
            "max_delay_count" => ParamValue::Int(self.max_delay_count),
            "delay" => ParamValue::Bool(self.delay),
            "delay_use_current_price" => ParamValue::Bool(self.delay_use_current_price),
            "tp_monotonic" => ParamValue::Bool(self.tp_monotonic),
            "tp_delay_n" => ParamValue::Int(self.tp_delay_n),
            "ignore_sell_sg" => ParamValue::Bool(self.ignore_sell_sg),
            "can_trade_when_high_eq_low" => ParamValue::Bool(self.can_trade_when_high_eq_low),
            "ev_open_position" => ParamValue::Bool(self.ev_open_position),
            "cn_open_position" => ParamValue::Bool(self.cn_open_position),
            "support_borrow_cash" => ParamValue::Bool(self.support_borrow_cash),
            "support_borrow_stock" => ParamValue::Bool(self.support_borrow_stock),
            _ => return None,
        })
    }

    /// Write a parameter by its table name. An unrecognised key is a hard
    /// error (spec.md §6: "`set_param` with an unrecognised key is a hard
    /// error").
    pub fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), ConfigError> {
        match name {
            "max_delay_count" => self.max_delay_count = value.as_int(name)?,
            "delay" => self.delay = value.as_bool(name)?,
            "delay_use_current_price" => self.delay_use_current_price = value.as_bool(name)?,
            "tp_monotonic" => self.tp_monotonic = value.as_bool(name)?,
            "tp_delay_n" => self.tp_delay_n = value.as_int(name)?,
            "ignore_sell_sg" => self.ignore_sell_sg = value.as_bool(name)?,
            "can_trade_when_high_eq_low" => self.can_trade_when_high_eq_low = value.as_bool(name)?,
            "ev_open_position" => self.ev_open_position = value.as_bool(name)?,
            "cn_open_position" => self.cn_open_position = value.as_bool(name)?,
            "support_borrow_cash" => self.support_borrow_cash = value.as_bool(name)?,
            "support_borrow_stock" => self.support_borrow_stock = value.as_bool(name)?,
            _ => return Err(ConfigError::UnknownParameter(name.to_string())),
        }
        Ok(())
    }
}
