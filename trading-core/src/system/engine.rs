//! `TradingSystem` — the per-bar state machine of spec.md §4.1.
//!
//! Phase order follows the teacher's own `run_backtest` four-phase bar loop
//! (`trendlab-core/src/engine/loop_runner.rs`: start-of-bar / intrabar /
//! end-of-bar / post-bar), generalized to this system's environment /
//! condition / signal / position-management phase order (spec.md §4.1.1),
//! and its `EngineConfig`/`EngineState` split (config vs. mutable run
//! state) generalized into `TsConfig` plus this struct's own mutable
//! fields.

use crate::domain::{Datetime, Direction, KRecord, OrderRequest, Part, PositionRecord, Stock, TradeRecord};
use crate::error::ReadyError;
use crate::plugins::fixtures::{
    AlwaysValidCondition, AlwaysValidEnvironment, FixedProfitGoal, FixedStoploss, FixedTakeProfit, NoSlippage,
};
use crate::plugins::{Condition, Environment, MoneyManager, ProfitGoal, Signal, Slippage, Stoploss, TakeProfit, TradeManager};

use super::config::{ParamValue, TsConfig};

/// The state machine itself. One instance is bound to one instrument at a
/// time via [`TradingSystem::set_to`] (spec.md §5).
#[derive(Clone)]
pub struct TradingSystem {
    config: TsConfig,
    stock: Stock,
    series: Vec<KRecord>,

    environment: Box<dyn Environment>,
    condition: Box<dyn Condition>,
    signal: Option<Box<dyn Signal>>,
    stoploss: Box<dyn Stoploss>,
    take_profit: Box<dyn TakeProfit>,
    profit_goal: Box<dyn ProfitGoal>,
    money_manager: Option<Box<dyn MoneyManager>>,
    slippage: Box<dyn Slippage>,
    trade_manager: Option<Box<dyn TradeManager>>,

    /// `[Option<OrderRequest>; 4]` indexed by `Direction::slot()` — the
    /// REDESIGN FLAGS note's "array indexed by (side, direction)" in place
    /// of the source's four explicitly-duplicated buffers.
    orders: [Option<OrderRequest>; 4],

    pre_ev_valid: bool,
    pre_cn_valid: bool,
    /// `m_lastTakeProfit` (spec.md §4.1.3), long side.
    last_take_profit: f64,
    /// Mirrored trailing level for the short side.
    last_take_profit_short: f64,
    bars_since_entry: u32,
    bars_since_short_entry: u32,
    /// Not consumed by any logic in this core — spec.md §9 Open Questions
    /// leaves downstream use of these counters unspecified; they are kept
    /// observable and nothing more.
    buy_days: u32,
    sell_short_days: u32,

    trade_list: Vec<TradeRecord>,
}

impl TradingSystem {
    pub fn new(stock: Stock) -> Self {
        Self {
            config: TsConfig::default(),
            stock,
            series: Vec::new(),
            environment: Box::new(AlwaysValidEnvironment),
            condition: Box::new(AlwaysValidCondition),
            signal: None,
            stoploss: Box::new(FixedStoploss::none()),
            take_profit: Box::new(FixedTakeProfit::none()),
            profit_goal: Box::new(FixedProfitGoal::none()),
            money_manager: None,
            slippage: Box::new(NoSlippage),
            trade_manager: None,
            orders: [None, None, None, None],
            pre_ev_valid: false,
            pre_cn_valid: false,
            last_take_profit: 0.0,
            last_take_profit_short: 0.0,
            bars_since_entry: 0,
            bars_since_short_entry: 0,
            buy_days: 0,
            sell_short_days: 0,
            trade_list: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: TsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_environment(mut self, environment: Box<dyn Environment>) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_condition(mut self, condition: Box<dyn Condition>) -> Self {
        self.condition = condition;
        self
    }

    pub fn with_signal(mut self, signal: Box<dyn Signal>) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn with_stoploss(mut self, stoploss: Box<dyn Stoploss>) -> Self {
        self.stoploss = stoploss;
        self
    }

    pub fn with_take_profit(mut self, take_profit: Box<dyn TakeProfit>) -> Self {
        self.take_profit = take_profit;
        self
    }

    pub fn with_profit_goal(mut self, profit_goal: Box<dyn ProfitGoal>) -> Self {
        self.profit_goal = profit_goal;
        self
    }

    pub fn with_money_manager(mut self, money_manager: Box<dyn MoneyManager>) -> Self {
        self.money_manager = Some(money_manager);
        self
    }

    pub fn with_slippage(mut self, slippage: Box<dyn Slippage>) -> Self {
        self.slippage = slippage;
        self
    }

    pub fn with_trade_manager(mut self, trade_manager: Box<dyn TradeManager>) -> Self {
        self.trade_manager = Some(trade_manager);
        self
    }

    pub fn stock(&self) -> &Stock {
        &self.stock
    }

    pub fn config(&self) -> &TsConfig {
        &self.config
    }

    pub fn get_param(&self, name: &str) -> Option<ParamValue> {
        self.config.get_param(name)
    }

    pub fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), crate::error::ConfigError> {
        self.config.set_param(name, value)?;
        if name == "support_borrow_cash" || name == "support_borrow_stock" {
            if let ParamValue::Bool(b) = value {
                if let Some(tm) = &mut self.trade_manager {
                    tm.set_param(name, b);
                }
            }
        }
        Ok(())
    }

    /// Bind the system to a candle series (spec.md §3: "mutated through
    /// `setTO(kdata)`"). Propagates to every plugin that is currently set,
    /// and wires `Condition`'s `TradeManager`/`Signal` dependencies.
    pub fn set_to(&mut self, series: &[KRecord]) {
        self.series = series.to_vec();
        self.environment.set_to(series);
        self.condition.set_to(series);
        if let Some(sg) = &mut self.signal {
            sg.set_to(series);
        }
        self.stoploss.set_to(series);
        self.take_profit.set_to(series);
        self.profit_goal.set_to(series);
        if let Some(mm) = &mut self.money_manager {
            mm.set_to(series);
        }
        self.slippage.set_to(series);
        self.wire_condition();
    }

    fn wire_condition(&mut self) {
        if let Some(tm) = &self.trade_manager {
            self.condition.set_tm(tm.as_ref());
        }
        if let Some(sg) = &self.signal {
            self.condition.set_sg(sg.as_ref());
        }
    }

    /// Checks that the three plugins spec.md §4.1.4 names as required are
    /// bound. `run()` is a no-op without panicking when this fails.
    pub fn ready_for_run(&self) -> Result<(), ReadyError> {
        if self.trade_manager.is_none() {
            return Err(ReadyError::MissingTradeManager);
        }
        if self.money_manager.is_none() {
            return Err(ReadyError::MissingMoneyManager);
        }
        if self.signal.is_none() {
            return Err(ReadyError::MissingSignal);
        }
        Ok(())
    }

    /// Returns the system to pristine state apart from `stock` (spec.md §3:
    /// "`reset()` returns all plugins to pristine state"). Idempotent (P6).
    pub fn reset(&mut self) {
        self.environment.reset();
        self.condition.reset();
        if let Some(sg) = &mut self.signal {
            sg.reset();
        }
        self.stoploss.reset();
        self.take_profit.reset();
        self.profit_goal.reset();
        if let Some(mm) = &mut self.money_manager {
            mm.reset();
        }
        self.slippage.reset();
        if let Some(tm) = &mut self.trade_manager {
            tm.reset();
        }
        self.series.clear();
        self.orders = [None, None, None, None];
        self.pre_ev_valid = false;
        self.pre_cn_valid = false;
        self.last_take_profit = 0.0;
        self.last_take_profit_short = 0.0;
        self.bars_since_entry = 0;
        self.bars_since_short_entry = 0;
        self.buy_days = 0;
        self.sell_short_days = 0;
        self.trade_list.clear();
    }

    pub fn trade_list(&self) -> &[TradeRecord] {
        &self.trade_list
    }

    pub fn long_position(&self) -> Option<PositionRecord> {
        self.trade_manager.as_ref().and_then(|tm| tm.get_position(&self.stock))
    }

    pub fn short_position(&self) -> Option<PositionRecord> {
        self.trade_manager.as_ref().and_then(|tm| tm.get_short_position(&self.stock))
    }

    pub fn is_holding_long(&self) -> bool {
        self.holding_long()
    }

    pub fn is_holding_short(&self) -> bool {
        self.holding_short()
    }

    /// `m_lastTakeProfit` (spec.md §4.1.3), long side.
    pub fn last_take_profit(&self) -> f64 {
        self.last_take_profit
    }

    pub fn buy_days(&self) -> u32 {
        self.buy_days
    }

    pub fn sell_short_days(&self) -> u32 {
        self.sell_short_days
    }

    /// Run the full series: binds it with `set_to`, then calls
    /// [`TradingSystem::run_moment`] for every bar at or after
    /// `TradeManager::init_datetime()` (spec.md §4.1.1 preamble), in order
    /// (invariant 1).
    pub fn run(&mut self, series: &[KRecord]) -> Result<&[TradeRecord], ReadyError> {
        self.ready_for_run()?;
        self.set_to(series);
        let init_dt = self.trade_manager.as_ref().unwrap().init_datetime();
        for k in series {
            if k.datetime < init_dt {
                continue;
            }
            self.run_moment(*k);
        }
        Ok(&self.trade_list)
    }

    fn holding_long(&self) -> bool {
        self.trade_manager
            .as_ref()
            .and_then(|tm| tm.get_position(&self.stock))
            .is_some()
    }

    fn holding_short(&self) -> bool {
        self.trade_manager
            .as_ref()
            .and_then(|tm| tm.get_short_position(&self.stock))
            .is_some()
    }

    /// The per-bar procedure of spec.md §4.1.1, steps 1–6.
    pub fn run_moment(&mut self, k: KRecord) -> Option<TradeRecord> {
        let degenerate = (k.is_degenerate() || k.close_out_of_range()) && !self.config.can_trade_when_high_eq_low;

        if self.holding_long() {
            self.bars_since_entry += 1;
        }
        if self.config.support_borrow_stock && self.holding_short() {
            self.bars_since_short_entry += 1;
        }

        // Step 2: delayed-order processing runs even on a degenerate bar,
        // per spec.md §4.1.4 ("keep delayed-order buffers alive"); on a
        // degenerate bar it only bumps/discards, never executes.
        if let Some(trade) = self.process_delayed_orders(&k, degenerate) {
            return Some(trade);
        }

        // Step 1: degenerate-bar gate — skip decision phases 3–6.
        if degenerate {
            return None;
        }

        if let Some(trade) = self.environment_phase(&k) {
            return Some(trade);
        }
        if let Some(trade) = self.condition_phase(&k) {
            return Some(trade);
        }
        if let Some(trade) = self.signal_phase(&k) {
            return Some(trade);
        }
        if let Some(trade) = self.position_management_phase(&k) {
            return Some(trade);
        }
        None
    }

    // ─── Step 2: delayed-order protocol (spec.md §4.1.2) ───

    fn process_delayed_orders(&mut self, k: &KRecord, degenerate: bool) -> Option<TradeRecord> {
        for direction in Direction::ALL {
            let slot = direction.slot();
            if self.orders[slot].is_none() {
                continue;
            }
            let req = self.orders[slot].take().unwrap();

            if degenerate {
                let mut req = req;
                req.count += 1;
                if !req.is_expired(self.config.max_delay_count) {
                    self.orders[slot] = Some(req);
                }
                return None;
            }

            let plan_price = k.open;
            let (stoploss, goal, number) = self.refresh_order_terms(direction, k, &req);

            let guard_ok = match direction {
                Direction::LongBuy => stoploss == 0.0 || plan_price > stoploss,
                Direction::ShortSell => stoploss == 0.0 || plan_price < stoploss,
                Direction::LongSell | Direction::ShortBuy => true,
            };
            if !guard_ok || number == 0.0 {
                return None;
            }

            let from = req.from;
            return match direction {
                Direction::LongBuy => self.execute_long_buy(k.datetime, plan_price, stoploss, goal, number, from),
                Direction::LongSell => self.execute_long_sell(k.datetime, plan_price, stoploss, goal, number, from),
                Direction::ShortSell => self.execute_short_entry(k.datetime, plan_price, stoploss, goal, number, from),
                Direction::ShortBuy => self.execute_short_exit(k.datetime, plan_price, stoploss, goal, number, from),
            };
        }
        None
    }

    fn refresh_order_terms(&self, direction: Direction, k: &KRecord, req: &OrderRequest) -> (f64, f64, f64) {
        if !self.config.delay_use_current_price {
            return (req.stoploss, req.goal, req.number);
        }
        match direction {
            Direction::LongBuy => {
                let stoploss = self.stoploss.get(k.datetime, k.open);
                let goal = self.profit_goal.get(k.datetime, k.open);
                let risk = if stoploss != 0.0 { k.open - stoploss } else { 0.0 };
                let raw = self
                    .money_manager
                    .as_ref()
                    .map(|mm| mm.get_buy_num(k.datetime, &self.stock, k.open, risk, req.from))
                    .unwrap_or(0.0);
                (stoploss, goal, self.stock.round_to_lot(raw))
            }
            Direction::LongSell => {
                let pos = self.trade_manager.as_ref().and_then(|tm| tm.get_position(&self.stock));
                let stoploss = pos.as_ref().map(|p| p.stoploss).unwrap_or(req.stoploss);
                let goal = pos.as_ref().map(|p| p.goal_price).unwrap_or(req.goal);
                let number = if req.from == Part::Stoploss {
                    pos.as_ref().map(|p| p.number).unwrap_or(0.0)
                } else {
                    let risk = pos.as_ref().map(|p| (p.avg_cost - p.stoploss).max(0.0)).unwrap_or(0.0);
                    let raw = self
                        .money_manager
                        .as_ref()
                        .map(|mm| mm.get_sell_num(k.datetime, &self.stock, k.open, risk, req.from))
                        .unwrap_or(0.0);
                    pos.as_ref()
                        .map(|p| self.stock.round_to_lot(raw).min(p.number))
                        .unwrap_or(0.0)
                };
                (stoploss, goal, number)
            }
            Direction::ShortSell => {
                let stoploss = self.stoploss.get(k.datetime, k.open);
                let goal = self.profit_goal.get(k.datetime, k.open);
                let risk = if stoploss != 0.0 { stoploss - k.open } else { 0.0 };
                let raw = self
                    .money_manager
                    .as_ref()
                    .map(|mm| mm.get_sell_short_num(k.datetime, &self.stock, k.open, risk, req.from))
                    .unwrap_or(0.0);
                (stoploss, goal, self.stock.round_to_lot(raw))
            }
            Direction::ShortBuy => {
                let pos = self.trade_manager.as_ref().and_then(|tm| tm.get_short_position(&self.stock));
                let stoploss = pos.as_ref().map(|p| p.stoploss).unwrap_or(req.stoploss);
                let goal = pos.as_ref().map(|p| p.goal_price).unwrap_or(req.goal);
                let number = if req.from == Part::Stoploss {
                    pos.as_ref().map(|p| p.number).unwrap_or(0.0)
                } else {
                    let risk = pos.as_ref().map(|p| (p.stoploss - p.avg_cost).max(0.0)).unwrap_or(0.0);
                    let raw = self
                        .money_manager
                        .as_ref()
                        .map(|mm| mm.get_buy_short_num(k.datetime, &self.stock, k.open, risk, req.from))
                        .unwrap_or(0.0);
                    pos.as_ref()
                        .map(|p| self.stock.round_to_lot(raw).min(p.number))
                        .unwrap_or(0.0)
                };
                (stoploss, goal, number)
            }
        }
    }

    fn submit_or_coalesce(&mut self, direction: Direction, from: Part, datetime: Datetime, plan_price: f64, stoploss: f64, goal: f64, number: f64) {
        let slot = direction.slot();
        if self.orders[slot].is_none() {
            self.orders[slot] = Some(OrderRequest::new(direction.business(), from, datetime, plan_price, stoploss, goal, number));
            return;
        }
        let req = self.orders[slot].as_mut().unwrap();
        req.count += 1;
        let expired = req.is_expired(self.config.max_delay_count);
        if expired {
            self.orders[slot] = None;
            return;
        }
        if self.config.delay_use_current_price {
            let req = self.orders[slot].as_mut().unwrap();
            req.from = from;
            req.datetime = datetime;
            req.plan_price = plan_price;
            req.stoploss = stoploss;
            req.goal = goal;
            req.number = number;
        }
    }

    // ─── Steps 3–4: Environment / Condition phases ───

    fn environment_phase(&mut self, k: &KRecord) -> Option<TradeRecord> {
        let valid = self.environment.is_valid(k.datetime);
        let pre = self.pre_ev_valid;
        self.pre_ev_valid = valid;
        self.revalidation_phase(k, pre, valid, self.config.ev_open_position, Part::Environment)
    }

    fn condition_phase(&mut self, k: &KRecord) -> Option<TradeRecord> {
        let valid = self.condition.is_valid(k.datetime);
        let pre = self.pre_cn_valid;
        self.pre_cn_valid = valid;
        self.revalidation_phase(k, pre, valid, self.config.cn_open_position, Part::Condition)
    }

    /// Shared true/false transition logic for Environment and Condition
    /// (spec.md §4.1.1 steps 3 and 4 share the same structure).
    fn revalidation_phase(&mut self, k: &KRecord, pre_valid: bool, valid: bool, open_position: bool, from: Part) -> Option<TradeRecord> {
        if pre_valid && !valid {
            if self.holding_long() {
                if let Some(t) = self.decide_long_exit(k, from) {
                    return Some(t);
                }
            }
            if self.config.support_borrow_stock && self.holding_short() {
                if let Some(t) = self.decide_short_exit(k, from) {
                    return Some(t);
                }
            }
        } else if !pre_valid && valid && open_position && !self.holding_long() {
            if let Some(t) = self.decide_long_entry(k, from) {
                return Some(t);
            }
        }
        None
    }

    // ─── Step 5: Signal phase ───

    fn signal_phase(&mut self, k: &KRecord) -> Option<TradeRecord> {
        let (should_buy, should_sell) = match &self.signal {
            Some(sg) => (sg.should_buy(k.datetime), sg.should_sell(k.datetime)),
            None => return None,
        };
        // "buy wins" tie-break (spec.md §4.1.1 step 5) — arbitrary, not to
        // be relied on (spec.md §9 Open Questions). Short side is the buy/sell
        // mirror image per spec.md §4.1.1's closing paragraph: a buy signal
        // covers an open short before it considers a fresh long entry; a sell
        // signal opens a short only once it is not the long-exit case.
        if should_buy {
            if self.config.support_borrow_stock && self.holding_short() {
                return self.decide_short_exit(k, Part::BuySignal);
            }
            if !self.holding_long() {
                return self.decide_long_entry(k, Part::BuySignal);
            }
        } else if should_sell {
            if self.holding_long() {
                if !self.config.ignore_sell_sg {
                    return self.decide_long_exit(k, Part::SellSignal);
                }
            } else if self.config.support_borrow_stock && !self.holding_short() {
                return self.decide_short_entry(k, Part::SellSignal);
            }
        }
        None
    }

    // ─── Step 6: Position management ───

    fn position_management_phase(&mut self, k: &KRecord) -> Option<TradeRecord> {
        if self.holding_long() {
            if let Some(t) = self.long_position_management(k) {
                return Some(t);
            }
        }
        if self.config.support_borrow_stock && self.holding_short() {
            if let Some(t) = self.short_position_management(k) {
                return Some(t);
            }
        }
        None
    }

    fn long_position_management(&mut self, k: &KRecord) -> Option<TradeRecord> {
        let pos = self.trade_manager.as_ref()?.get_position(&self.stock)?;
        if pos.stoploss != 0.0 && k.close <= pos.stoploss {
            return self.decide_long_exit(k, Part::Stoploss);
        }
        let goal = self.profit_goal.get(k.datetime, k.close);
        if goal != 0.0 && k.close >= goal {
            return self.decide_long_exit(k, Part::ProfitGoal);
        }
        if self.bars_since_entry < self.config.tp_delay_n {
            return None;
        }
        let candidate = self.take_profit.get(k.datetime);
        if candidate == 0.0 {
            return None;
        }
        let new_tp = if self.config.tp_monotonic {
            candidate.max(self.last_take_profit)
        } else {
            candidate
        };
        self.last_take_profit = new_tp;
        if k.close <= new_tp {
            return self.decide_long_exit(k, Part::TakeProfit);
        }
        None
    }

    fn short_position_management(&mut self, k: &KRecord) -> Option<TradeRecord> {
        let pos = self.trade_manager.as_ref()?.get_short_position(&self.stock)?;
        if pos.stoploss != 0.0 && k.close >= pos.stoploss {
            return self.decide_short_exit(k, Part::Stoploss);
        }
        let goal = self.profit_goal.get(k.datetime, k.close);
        if goal != 0.0 && k.close <= goal {
            return self.decide_short_exit(k, Part::ProfitGoal);
        }
        if self.bars_since_short_entry < self.config.tp_delay_n {
            return None;
        }
        let candidate = self.take_profit.get(k.datetime);
        if candidate == 0.0 {
            return None;
        }
        let new_tp = if self.config.tp_monotonic && self.last_take_profit_short != 0.0 {
            candidate.min(self.last_take_profit_short)
        } else {
            candidate
        };
        self.last_take_profit_short = new_tp;
        if k.close >= new_tp {
            return self.decide_short_exit(k, Part::TakeProfit);
        }
        None
    }

    // ─── Decision helpers: long side ───

    fn decide_long_entry(&mut self, k: &KRecord, from: Part) -> Option<TradeRecord> {
        let plan_price = k.close;
        let stoploss = self.stoploss.get(k.datetime, plan_price);
        // invariant 5: planPrice > stoploss required for any long entry.
        if stoploss != 0.0 && plan_price <= stoploss {
            return None;
        }
        let goal = self.profit_goal.get(k.datetime, plan_price);
        let risk = if stoploss != 0.0 { plan_price - stoploss } else { 0.0 };
        let raw = self.money_manager.as_ref()?.get_buy_num(k.datetime, &self.stock, plan_price, risk, from);
        let number = self.stock.round_to_lot(raw);
        if number == 0.0 {
            return None;
        }
        if !self.config.delay {
            return self.execute_long_buy(k.datetime, plan_price, stoploss, goal, number, from);
        }
        self.submit_or_coalesce(Direction::LongBuy, from, k.datetime, plan_price, stoploss, goal, number);
        None
    }

    fn decide_long_exit(&mut self, k: &KRecord, from: Part) -> Option<TradeRecord> {
        let pos = self.trade_manager.as_ref()?.get_position(&self.stock)?;
        let plan_price = k.close;
        // invariant 7: stoploss exits use the full held quantity.
        let number = if from == Part::Stoploss {
            pos.number
        } else {
            let risk = (pos.avg_cost - pos.stoploss).max(0.0);
            let raw = self.money_manager.as_ref()?.get_sell_num(k.datetime, &self.stock, plan_price, risk, from);
            self.stock.round_to_lot(raw).min(pos.number)
        };
        if number == 0.0 {
            return None;
        }
        if !self.config.delay {
            return self.execute_long_sell(k.datetime, plan_price, pos.stoploss, pos.goal_price, number, from);
        }
        self.submit_or_coalesce(Direction::LongSell, from, k.datetime, plan_price, pos.stoploss, pos.goal_price, number);
        None
    }

    fn execute_long_buy(&mut self, datetime: Datetime, plan_price: f64, stoploss: f64, goal: f64, number: f64, from: Part) -> Option<TradeRecord> {
        let real_price = self.slippage.get_real_buy_price(datetime, plan_price);
        let trade = self
            .trade_manager
            .as_mut()?
            .buy(datetime, &self.stock, plan_price, real_price, number, stoploss, goal, from);
        if !trade.is_trade() {
            return None;
        }
        if let Some(mm) = self.money_manager.as_mut() {
            mm.buy_notify(&trade);
        }
        self.last_take_profit = real_price;
        self.buy_days += 1;
        self.bars_since_entry = 0;
        self.trade_list.push(trade.clone());
        Some(trade)
    }

    fn execute_long_sell(&mut self, datetime: Datetime, plan_price: f64, stoploss: f64, goal: f64, number: f64, from: Part) -> Option<TradeRecord> {
        let real_price = self.slippage.get_real_sell_price(datetime, plan_price);
        let trade = self
            .trade_manager
            .as_mut()?
            .sell(datetime, &self.stock, plan_price, real_price, number, stoploss, goal, from);
        if !trade.is_trade() {
            return None;
        }
        if let Some(mm) = self.money_manager.as_mut() {
            mm.sell_notify(&trade);
        }
        if !self.holding_long() {
            self.last_take_profit = 0.0;
        }
        self.trade_list.push(trade.clone());
        Some(trade)
    }

    // ─── Decision helpers: short side (mirrors long with sign inversions) ───

    fn decide_short_entry(&mut self, k: &KRecord, from: Part) -> Option<TradeRecord> {
        let plan_price = k.close;
        let stoploss = self.stoploss.get(k.datetime, plan_price);
        // symmetric invariant 5: planPrice < stoploss required for short entry.
        if stoploss != 0.0 && plan_price >= stoploss {
            return None;
        }
        let goal = self.profit_goal.get(k.datetime, plan_price);
        let risk = if stoploss != 0.0 { stoploss - plan_price } else { 0.0 };
        let raw = self.money_manager.as_ref()?.get_sell_short_num(k.datetime, &self.stock, plan_price, risk, from);
        let number = self.stock.round_to_lot(raw);
        if number == 0.0 {
            return None;
        }
        if !self.config.delay {
            return self.execute_short_entry(k.datetime, plan_price, stoploss, goal, number, from);
        }
        self.submit_or_coalesce(Direction::ShortSell, from, k.datetime, plan_price, stoploss, goal, number);
        None
    }

    fn decide_short_exit(&mut self, k: &KRecord, from: Part) -> Option<TradeRecord> {
        let pos = self.trade_manager.as_ref()?.get_short_position(&self.stock)?;
        let plan_price = k.close;
        let number = if from == Part::Stoploss {
            pos.number
        } else {
            let risk = (pos.stoploss - pos.avg_cost).max(0.0);
            let raw = self.money_manager.as_ref()?.get_buy_short_num(k.datetime, &self.stock, plan_price, risk, from);
            self.stock.round_to_lot(raw).min(pos.number)
        };
        if number == 0.0 {
            return None;
        }
        if !self.config.delay {
            return self.execute_short_exit(k.datetime, plan_price, pos.stoploss, pos.goal_price, number, from);
        }
        self.submit_or_coalesce(Direction::ShortBuy, from, k.datetime, plan_price, pos.stoploss, pos.goal_price, number);
        None
    }

    fn execute_short_entry(&mut self, datetime: Datetime, plan_price: f64, stoploss: f64, goal: f64, number: f64, from: Part) -> Option<TradeRecord> {
        let real_price = self.slippage.get_real_sell_price(datetime, plan_price);
        let trade = self
            .trade_manager
            .as_mut()?
            .sell_short(datetime, &self.stock, plan_price, real_price, number, stoploss, goal, from);
        if !trade.is_trade() {
            return None;
        }
        if let Some(mm) = self.money_manager.as_mut() {
            mm.sell_notify(&trade);
        }
        self.last_take_profit_short = real_price;
        self.sell_short_days += 1;
        self.bars_since_short_entry = 0;
        self.trade_list.push(trade.clone());
        Some(trade)
    }

    fn execute_short_exit(&mut self, datetime: Datetime, plan_price: f64, stoploss: f64, goal: f64, number: f64, from: Part) -> Option<TradeRecord> {
        let real_price = self.slippage.get_real_buy_price(datetime, plan_price);
        let trade = self
            .trade_manager
            .as_mut()?
            .buy_short(datetime, &self.stock, plan_price, real_price, number, stoploss, goal, from);
        if !trade.is_trade() {
            return None;
        }
        if let Some(mm) = self.money_manager.as_mut() {
            mm.buy_notify(&trade);
        }
        if !self.holding_short() {
            self.last_take_profit_short = 0.0;
        }
        self.trade_list.push(trade.clone());
        Some(trade)
    }
}
