//! In-crate reference implementations of every plugin trait.
//!
//! Not a substitute for the plugin interfaces being owned by the host
//! process in production (spec.md §1 places strategy building blocks out of
//! scope) — these exist so the end-to-end scenarios in spec.md §8 and the
//! crate's own test suite can exercise `TradingSystem` without depending on
//! an external strategy implementation, mirroring the teacher's own
//! `NullSignal`/`NoFilter`/`NoOpPm` trivial-implementation pattern
//! (`trendlab-core/src/components/{signal,filter,pm}.rs`).

use crate::domain::{CostRecord, Datetime, KRecord, Part, PositionRecord, Stock, TradeRecord};
use crate::plugins::condition::Condition;
use crate::plugins::cost_model::CostModel;
use crate::plugins::environment::Environment;
use crate::plugins::money_manager::MoneyManager;
use crate::plugins::profit_goal::ProfitGoal;
use crate::plugins::signal::Signal;
use crate::plugins::slippage::Slippage;
use crate::plugins::stoploss::{Stoploss, TakeProfit};
use crate::plugins::trade_manager::TradeManager;
use crate::domain::Business;

/// `Environment` that is always valid — a strategy with no regime filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysValidEnvironment;

impl Environment for AlwaysValidEnvironment {
    fn is_valid(&self, _datetime: Datetime) -> bool {
        true
    }

    fn clone_box(&self) -> Box<dyn Environment> {
        Box::new(*self)
    }
}

/// `Condition` that is always valid, ignoring any wired-in `TradeManager`/
/// `Signal`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysValidCondition;

impl Condition for AlwaysValidCondition {
    fn is_valid(&self, _datetime: Datetime) -> bool {
        true
    }

    fn clone_box(&self) -> Box<dyn Condition> {
        Box::new(*self)
    }
}

/// `Signal` that never fires. Useful as the "nothing happens" baseline and
/// as a default before a host wires in a real strategy signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSignal;

impl Signal for NullSignal {
    fn should_buy(&self, _datetime: Datetime) -> bool {
        false
    }

    fn should_sell(&self, _datetime: Datetime) -> bool {
        false
    }

    fn clone_box(&self) -> Box<dyn Signal> {
        Box::new(*self)
    }
}

/// A `Signal` scripted by bar index, for deterministic test scenarios.
/// `should_buy`/`should_sell` look up the bar index matching `datetime`
/// within the series bound via `set_to`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSignal {
    series: Vec<KRecord>,
    buy_bars: Vec<usize>,
    sell_bars: Vec<usize>,
}

impl ScriptedSignal {
    pub fn new(buy_bars: Vec<usize>, sell_bars: Vec<usize>) -> Self {
        Self {
            series: Vec::new(),
            buy_bars,
            sell_bars,
        }
    }

    fn bar_index(&self, datetime: Datetime) -> Option<usize> {
        self.series.iter().position(|k| k.datetime == datetime)
    }
}

impl Signal for ScriptedSignal {
    fn should_buy(&self, datetime: Datetime) -> bool {
        self.bar_index(datetime)
            .is_some_and(|i| self.buy_bars.contains(&i))
    }

    fn should_sell(&self, datetime: Datetime) -> bool {
        self.bar_index(datetime)
            .is_some_and(|i| self.sell_bars.contains(&i))
    }

    fn set_to(&mut self, series: &[KRecord]) {
        self.series = series.to_vec();
    }

    fn reset(&mut self) {
        self.series.clear();
    }

    fn clone_box(&self) -> Box<dyn Signal> {
        Box::new(self.clone())
    }
}

/// `Stoploss` at a fixed offset below `price` (the plan/entry price passed
/// to `get`). `offset == 0.0` means "no bound" (returns 0), matching the
/// plugin contract's "0 means none".
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedStoploss {
    pub offset: f64,
}

impl FixedStoploss {
    pub fn new(offset: f64) -> Self {
        Self { offset }
    }

    pub fn none() -> Self {
        Self { offset: 0.0 }
    }
}

impl Stoploss for FixedStoploss {
    fn get(&self, _datetime: Datetime, price: f64) -> f64 {
        if self.offset == 0.0 {
            0.0
        } else {
            price - self.offset
        }
    }

    fn clone_box(&self) -> Box<dyn Stoploss> {
        Box::new(*self)
    }
}

/// `TakeProfit` at a fixed absolute level. `level == 0.0` means "no bound".
/// Unlike `FixedStoploss`/`FixedProfitGoal`, `TakeProfit::get` receives no
/// price argument (spec.md §6), so "offset from entry" is baked in at
/// construction by whoever knows the entry price (typically a test).
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedTakeProfit {
    pub level: f64,
}

impl FixedTakeProfit {
    pub fn new(level: f64) -> Self {
        Self { level }
    }

    pub fn none() -> Self {
        Self { level: 0.0 }
    }
}

impl TakeProfit for FixedTakeProfit {
    fn get(&self, _datetime: Datetime) -> f64 {
        self.level
    }

    fn clone_box(&self) -> Box<dyn TakeProfit> {
        Box::new(*self)
    }
}

/// `ProfitGoal` at a fixed offset above `price`. `offset == 0.0` means "no
/// bound".
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedProfitGoal {
    pub offset: f64,
}

impl FixedProfitGoal {
    pub fn new(offset: f64) -> Self {
        Self { offset }
    }

    pub fn none() -> Self {
        Self { offset: 0.0 }
    }
}

impl ProfitGoal for FixedProfitGoal {
    fn get(&self, _datetime: Datetime, price: f64) -> f64 {
        if self.offset == 0.0 {
            0.0
        } else {
            price + self.offset
        }
    }

    fn clone_box(&self) -> Box<dyn ProfitGoal> {
        Box::new(*self)
    }
}

/// `MoneyManager` that always asks for a fixed quantity (before lot
/// rounding, which the `TradingSystem` applies).
#[derive(Debug, Clone, Copy)]
pub struct FixedQuantityMoneyManager {
    pub quantity: f64,
}

impl FixedQuantityMoneyManager {
    pub fn new(quantity: f64) -> Self {
        Self { quantity }
    }
}

impl Default for FixedQuantityMoneyManager {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl MoneyManager for FixedQuantityMoneyManager {
    fn get_buy_num(&self, _datetime: Datetime, _stock: &Stock, _price: f64, _risk: f64, _from: Part) -> f64 {
        self.quantity
    }

    fn get_sell_num(&self, _datetime: Datetime, _stock: &Stock, _price: f64, _risk: f64, _from: Part) -> f64 {
        self.quantity
    }

    fn get_sell_short_num(&self, _datetime: Datetime, _stock: &Stock, _price: f64, _risk: f64, _from: Part) -> f64 {
        self.quantity
    }

    fn get_buy_short_num(&self, _datetime: Datetime, _stock: &Stock, _price: f64, _risk: f64, _from: Part) -> f64 {
        self.quantity
    }

    fn clone_box(&self) -> Box<dyn MoneyManager> {
        Box::new(*self)
    }
}

/// `Slippage` that applies no slippage: real price equals plan price.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSlippage;

impl Slippage for NoSlippage {
    fn get_real_buy_price(&self, _datetime: Datetime, plan_price: f64) -> f64 {
        plan_price
    }

    fn get_real_sell_price(&self, _datetime: Datetime, plan_price: f64) -> f64 {
        plan_price
    }

    fn clone_box(&self) -> Box<dyn Slippage> {
        Box::new(*self)
    }
}

/// `CostModel` with every cost at zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroCostModel;

impl CostModel for ZeroCostModel {
    fn get_buy_cost(&self, _datetime: Datetime, _stock: &Stock, _price: f64, _num: f64) -> CostRecord {
        CostRecord::zero()
    }

    fn get_sell_cost(&self, _datetime: Datetime, _stock: &Stock, _price: f64, _num: f64) -> CostRecord {
        CostRecord::zero()
    }

    fn clone_box(&self) -> Box<dyn CostModel> {
        Box::new(*self)
    }
}

/// A minimal cash/position ledger: one long position and one short position
/// in a single instrument, enough to drive and verify the state machine's
/// order-delay protocol and P1–P7 without a full accounting engine.
#[derive(Debug, Clone)]
pub struct InMemoryTradeManager {
    cash: f64,
    init_datetime: Datetime,
    long: PositionRecord,
    short: PositionRecord,
    support_borrow_cash: bool,
    support_borrow_stock: bool,
    cost_model: Box<dyn CostModel>,
    trades: Vec<TradeRecord>,
}

impl InMemoryTradeManager {
    pub fn new(stock: Stock, cash: f64, init_datetime: Datetime) -> Self {
        Self {
            cash,
            init_datetime,
            long: PositionRecord::flat(stock.clone()),
            short: PositionRecord::flat(stock),
            support_borrow_cash: false,
            support_borrow_stock: false,
            cost_model: Box::new(ZeroCostModel),
            trades: Vec::new(),
        }
    }

    pub fn with_cost_model(mut self, cost_model: Box<dyn CostModel>) -> Self {
        self.cost_model = cost_model;
        self
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    fn reject(datetime: Datetime, stock: &Stock, part: Part) -> TradeRecord {
        TradeRecord::rejected(datetime, stock.clone(), part)
    }
}

impl TradeManager for InMemoryTradeManager {
    fn buy(
        &mut self,
        datetime: Datetime,
        stock: &Stock,
        plan_price: f64,
        real_price: f64,
        number: f64,
        stoploss: f64,
        goal_price: f64,
        from: Part,
    ) -> TradeRecord {
        if number <= 0.0 {
            return Self::reject(datetime, stock, from);
        }
        let cost = self.cost_model.get_buy_cost(datetime, stock, real_price, number);
        let total = real_price * number + cost.total();
        if total > self.cash && !self.support_borrow_cash {
            return Self::reject(datetime, stock, from);
        }
        self.cash -= total;
        if self.long.is_flat() {
            self.long.entry_datetime = datetime;
            self.long.avg_cost = real_price;
            self.long.number = number;
        } else {
            let total_cost = self.long.avg_cost * self.long.number + real_price * number;
            self.long.number += number;
            self.long.avg_cost = total_cost / self.long.number;
        }
        self.long.stoploss = stoploss;
        self.long.goal_price = goal_price;
        self.long.total_risk = (real_price - stoploss).max(0.0) * self.long.number;
        let trade = TradeRecord {
            datetime,
            stock: stock.clone(),
            business: Business::Buy,
            price: real_price,
            number,
            cost,
            plan_price,
            stoploss,
            goal_price,
            real_price,
            part: from,
            cash: self.cash,
            position: self.long.number,
        };
        self.trades.push(trade.clone());
        trade
    }

    fn sell(
        &mut self,
        datetime: Datetime,
        stock: &Stock,
        plan_price: f64,
        real_price: f64,
        number: f64,
        stoploss: f64,
        goal_price: f64,
        from: Part,
    ) -> TradeRecord {
        if number <= 0.0 || number > self.long.number {
            return Self::reject(datetime, stock, from);
        }
        let cost = self.cost_model.get_sell_cost(datetime, stock, real_price, number);
        self.cash += real_price * number - cost.total();
        self.long.number -= number;
        if self.long.number <= 0.0 {
            self.long = PositionRecord::flat(stock.clone());
        }
        let trade = TradeRecord {
            datetime,
            stock: stock.clone(),
            business: Business::Sell,
            price: real_price,
            number,
            cost,
            plan_price,
            stoploss,
            goal_price,
            real_price,
            part: from,
            cash: self.cash,
            position: self.long.number,
        };
        self.trades.push(trade.clone());
        trade
    }

    fn buy_short(
        &mut self,
        datetime: Datetime,
        stock: &Stock,
        plan_price: f64,
        real_price: f64,
        number: f64,
        stoploss: f64,
        goal_price: f64,
        from: Part,
    ) -> TradeRecord {
        if number <= 0.0 || number > self.short.number {
            return Self::reject(datetime, stock, from);
        }
        let cost = self.cost_model.get_buy_cost(datetime, stock, real_price, number);
        self.cash -= real_price * number + cost.total();
        self.short.number -= number;
        if self.short.number <= 0.0 {
            self.short = PositionRecord::flat(stock.clone());
        }
        let trade = TradeRecord {
            datetime,
            stock: stock.clone(),
            business: Business::BuyShort,
            price: real_price,
            number,
            cost,
            plan_price,
            stoploss,
            goal_price,
            real_price,
            part: from,
            cash: self.cash,
            position: self.short.number,
        };
        self.trades.push(trade.clone());
        trade
    }

    fn sell_short(
        &mut self,
        datetime: Datetime,
        stock: &Stock,
        plan_price: f64,
        real_price: f64,
        number: f64,
        stoploss: f64,
        goal_price: f64,
        from: Part,
    ) -> TradeRecord {
        if number <= 0.0 || !self.support_borrow_stock {
            return Self::reject(datetime, stock, from);
        }
        let cost = self.cost_model.get_sell_cost(datetime, stock, real_price, number);
        self.cash += real_price * number - cost.total();
        if self.short.is_flat() {
            self.short.entry_datetime = datetime;
            self.short.avg_cost = real_price;
            self.short.number = number;
        } else {
            let total_cost = self.short.avg_cost * self.short.number + real_price * number;
            self.short.number += number;
            self.short.avg_cost = total_cost / self.short.number;
        }
        self.short.stoploss = stoploss;
        self.short.goal_price = goal_price;
        self.short.total_risk = (stoploss - real_price).max(0.0) * self.short.number;
        let trade = TradeRecord {
            datetime,
            stock: stock.clone(),
            business: Business::SellShort,
            price: real_price,
            number,
            cost,
            plan_price,
            stoploss,
            goal_price,
            real_price,
            part: from,
            cash: self.cash,
            position: self.short.number,
        };
        self.trades.push(trade.clone());
        trade
    }

    fn get_position(&self, _stock: &Stock) -> Option<PositionRecord> {
        if self.long.is_flat() {
            None
        } else {
            Some(self.long.clone())
        }
    }

    fn get_short_position(&self, _stock: &Stock) -> Option<PositionRecord> {
        if self.short.is_flat() {
            None
        } else {
            Some(self.short.clone())
        }
    }

    fn have(&self, _stock: &Stock) -> bool {
        !self.long.is_flat()
    }

    fn get_hold_number(&self, _datetime: Datetime, _stock: &Stock) -> f64 {
        self.long.number
    }

    fn init_datetime(&self) -> Datetime {
        self.init_datetime
    }

    fn set_param(&mut self, name: &str, value: bool) {
        match name {
            "support_borrow_cash" => self.support_borrow_cash = value,
            "support_borrow_stock" => self.support_borrow_stock = value,
            _ => {}
        }
    }

    fn trade_list(&self) -> &[TradeRecord] {
        &self.trades
    }

    fn reset(&mut self) {
        self.long = PositionRecord::flat(self.long.stock.clone());
        self.short = PositionRecord::flat(self.short.stock.clone());
        self.trades.clear();
    }

    fn clone_box(&self) -> Box<dyn TradeManager> {
        Box::new(self.clone())
    }
}
