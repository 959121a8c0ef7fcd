//! End-to-end scenarios for `TradingSystem`, seeded by the same cases the
//! property suite is checked against (see `property_tests.rs`).

use trading_core::domain::{Business, Datetime, KRecord, Part, Stock, TimeDelta};
use trading_core::plugins::fixtures::{
    FixedProfitGoal, FixedQuantityMoneyManager, FixedStoploss, FixedTakeProfit, InMemoryTradeManager, NoSlippage,
    ScriptedSignal,
};
use trading_core::plugins::{Environment, Signal};
use trading_core::system::{ParamValue, TradingSystem, TsConfig};

const DAY: TimeDelta = TimeDelta::from_hours(24);

fn dt(i: i64) -> Datetime {
    Datetime::from_unix_micros(0) + TimeDelta::from_ticks(i * DAY.ticks())
}

fn flat_bar(i: i64, close: f64) -> KRecord {
    KRecord::new(dt(i), close - 1.0, close + 1.0, close - 2.0, close, 1_000.0, close * 1_000.0)
}

fn stock() -> Stock {
    Stock::new("TEST", 100.0, 1_000_000.0, 0.01, 1.0)
}

fn trade_manager(cash: f64) -> InMemoryTradeManager {
    InMemoryTradeManager::new(stock(), cash, dt(0))
}

/// Always-buy, never-sell signal — used for scenario 4 and 5 where every
/// bar is a buy candidate, which `ScriptedSignal`'s finite bar list can't
/// express cheaply.
#[derive(Debug, Clone, Copy, Default)]
struct AlwaysBuySignal;

impl Signal for AlwaysBuySignal {
    fn should_buy(&self, _datetime: Datetime) -> bool {
        true
    }

    fn should_sell(&self, _datetime: Datetime) -> bool {
        false
    }

    fn clone_box(&self) -> Box<dyn Signal> {
        Box::new(*self)
    }
}

/// `Environment` that is valid for bars `[0, flip_bar_index)` and invalid
/// from `flip_bar_index` on — scenario-specific, so it stays local to this
/// test file rather than joining the crate's reusable fixtures.
#[derive(Debug, Clone, Default)]
struct ScriptedEnvironment {
    flip_bar_index: usize,
    series: Vec<KRecord>,
}

impl Environment for ScriptedEnvironment {
    fn is_valid(&self, datetime: Datetime) -> bool {
        match self.series.iter().position(|k| k.datetime == datetime) {
            Some(i) => i < self.flip_bar_index,
            None => true,
        }
    }

    fn set_to(&mut self, series: &[KRecord]) {
        self.series = series.to_vec();
    }

    fn reset(&mut self) {
        self.series.clear();
    }

    fn clone_box(&self) -> Box<dyn Environment> {
        Box::new(self.clone())
    }
}

/// Scenario 1: buy-and-hold smoke. Signal buys once on bar 5, `delay=true`
/// (the default) — expect the BUY to execute on bar 6, one trade total,
/// position held through the end of the series.
#[test]
fn scenario_buy_and_hold_smoke() {
    let series: Vec<KRecord> = (0..12).map(|i| flat_bar(i, 100.0)).collect();
    let sg = ScriptedSignal::new(vec![5], vec![]);

    let mut ts = TradingSystem::new(stock())
        .with_signal(Box::new(sg))
        .with_money_manager(Box::new(FixedQuantityMoneyManager::new(100.0)))
        .with_trade_manager(Box::new(trade_manager(100_000.0)))
        .with_slippage(Box::new(NoSlippage));

    ts.run(&series).unwrap();

    assert_eq!(ts.trade_list().len(), 1);
    let trade = &ts.trade_list()[0];
    assert_eq!(trade.business, Business::Buy);
    assert_eq!(trade.part, Part::BuySignal);
    assert_eq!(trade.datetime, series[6].datetime);
    assert!(ts.is_holding_long());
}

/// Scenario 2: immediate mode — same as scenario 1 with `delay=false`.
/// Expect the BUY to execute on the decision bar itself, at its close.
#[test]
fn scenario_immediate_mode() {
    let series: Vec<KRecord> = (0..12).map(|i| flat_bar(i, 100.0)).collect();
    let sg = ScriptedSignal::new(vec![5], vec![]);

    let mut ts = TradingSystem::new(stock())
        .with_config(TsConfig { delay: false, ..TsConfig::default() })
        .with_signal(Box::new(sg))
        .with_money_manager(Box::new(FixedQuantityMoneyManager::new(100.0)))
        .with_trade_manager(Box::new(trade_manager(100_000.0)))
        .with_slippage(Box::new(NoSlippage));

    ts.run(&series).unwrap();

    assert_eq!(ts.trade_list().len(), 1);
    let trade = &ts.trade_list()[0];
    assert_eq!(trade.business, Business::Buy);
    assert_eq!(trade.datetime, series[5].datetime);
    assert_eq!(trade.price, 100.0);
}

/// Scenario 3: stoploss exit. Enter on bar 5 at close 100 with stoploss 95;
/// bar 10's low/close (94) breaches it. Expect a SELL on bar 10 from
/// `STOPLOSS`, using the full held quantity.
#[test]
fn scenario_stoploss_exit() {
    let mut series: Vec<KRecord> = (0..12).map(|i| flat_bar(i, 100.0)).collect();
    series[10] = KRecord::new(dt(10), 97.0, 98.0, 94.0, 94.0, 1_000.0, 94_000.0);

    let sg = ScriptedSignal::new(vec![5], vec![]);

    let mut ts = TradingSystem::new(stock())
        .with_config(TsConfig { delay: false, ..TsConfig::default() })
        .with_signal(Box::new(sg))
        .with_stoploss(Box::new(FixedStoploss::new(5.0)))
        .with_money_manager(Box::new(FixedQuantityMoneyManager::new(100.0)))
        .with_trade_manager(Box::new(trade_manager(100_000.0)))
        .with_slippage(Box::new(NoSlippage));

    ts.run(&series).unwrap();

    assert_eq!(ts.trade_list().len(), 2);
    let entry = &ts.trade_list()[0];
    assert_eq!(entry.business, Business::Buy);
    assert_eq!(entry.stoploss, 95.0);

    let exit = &ts.trade_list()[1];
    assert_eq!(exit.business, Business::Sell);
    assert_eq!(exit.part, Part::Stoploss);
    assert_eq!(exit.datetime, series[10].datetime);
    assert_eq!(exit.number, entry.number);
    assert!(!ts.is_holding_long());
}

/// Scenario 4: delay overflow. The signal buys on every bar; four
/// consecutive degenerate bars follow the decision bar, each bumping the
/// buffered order's retry count. With the default `max_delay_count = 3`,
/// the buffer is discarded on the third bump (count exceeds 3) — the
/// fourth degenerate bar finds no live order left to bump, matching
/// spec.md §8 scenario 4's "cleared after 3 retries" over its documented
/// 4-consecutive-degenerate-bar span.
#[test]
fn scenario_delay_overflow_discards_order() {
    let mut series = vec![flat_bar(0, 100.0)];
    for i in 1..5 {
        series.push(KRecord::new(dt(i), 100.0, 100.0, 100.0, 100.0, 1_000.0, 100_000.0));
    }
    series.push(flat_bar(5, 100.0));

    let mut ts = TradingSystem::new(stock())
        .with_signal(Box::new(AlwaysBuySignal))
        .with_money_manager(Box::new(FixedQuantityMoneyManager::new(100.0)))
        .with_trade_manager(Box::new(trade_manager(100_000.0)))
        .with_slippage(Box::new(NoSlippage));

    ts.run(&series).unwrap();

    assert!(ts.trade_list().is_empty());
    assert!(!ts.is_holding_long());
}

/// Scenario 5: environment flush. Environment is valid for bars 0-9, then
/// invalid from bar 10. The strategy is long (entered via the always-buy
/// signal on bar 0). Expect a SELL on bar 11 (delayed one bar) from
/// `ENVIRONMENT`.
#[test]
fn scenario_environment_flush() {
    let series: Vec<KRecord> = (0..12).map(|i| flat_bar(i, 100.0)).collect();

    let env = ScriptedEnvironment { flip_bar_index: 10, series: Vec::new() };

    let mut ts = TradingSystem::new(stock())
        .with_environment(Box::new(env))
        .with_signal(Box::new(AlwaysBuySignal))
        .with_money_manager(Box::new(FixedQuantityMoneyManager::new(100.0)))
        .with_trade_manager(Box::new(trade_manager(100_000.0)))
        .with_slippage(Box::new(NoSlippage));

    ts.run(&series).unwrap();

    assert!(ts.is_holding_long() || ts.trade_list().iter().any(|t| t.business == Business::Buy));
    let exit = ts
        .trade_list()
        .iter()
        .find(|t| t.part == Part::Environment)
        .expect("environment-triggered exit");
    assert_eq!(exit.business, Business::Sell);
    assert_eq!(exit.datetime, series[11].datetime);
}

/// Exercises `FixedProfitGoal`/`FixedTakeProfit` wiring end-to-end: a goal
/// set tight enough to fire before the stoploss ever could.
#[test]
fn profit_goal_exit_fires_before_stoploss() {
    let mut series: Vec<KRecord> = (0..8).map(|i| flat_bar(i, 100.0)).collect();
    series[3] = KRecord::new(dt(3), 108.0, 109.0, 107.0, 108.0, 1_000.0, 108_000.0);

    let sg = ScriptedSignal::new(vec![0], vec![]);

    let mut ts = TradingSystem::new(stock())
        .with_config(TsConfig { delay: false, ..TsConfig::default() })
        .with_signal(Box::new(sg))
        .with_stoploss(Box::new(FixedStoploss::new(10.0)))
        .with_profit_goal(Box::new(FixedProfitGoal::new(5.0)))
        .with_take_profit(Box::new(FixedTakeProfit::none()))
        .with_money_manager(Box::new(FixedQuantityMoneyManager::new(100.0)))
        .with_trade_manager(Box::new(trade_manager(100_000.0)))
        .with_slippage(Box::new(NoSlippage));

    ts.run(&series).unwrap();

    let exit = ts
        .trade_list()
        .iter()
        .find(|t| t.part == Part::ProfitGoal)
        .expect("profit-goal exit");
    assert_eq!(exit.business, Business::Sell);
    assert_eq!(exit.datetime, series[3].datetime);
}

/// Short-side symmetry (spec.md §4.1 "Short-side logic is symmetric when
/// `support_borrow_stock` is true"): a sell signal while flat opens a short,
/// a later buy signal covers it. Mirrors `scenario_buy_and_hold_smoke` with
/// every sign inverted.
#[test]
fn scenario_short_entry_and_cover() {
    let series: Vec<KRecord> = (0..12).map(|i| flat_bar(i, 100.0)).collect();
    let sg = ScriptedSignal::new(vec![8], vec![5]);

    let mut tm = trade_manager(100_000.0);
    tm.set_param("support_borrow_stock", true);

    let mut ts = TradingSystem::new(stock())
        .with_config(TsConfig { support_borrow_stock: true, ..TsConfig::default() })
        .with_signal(Box::new(sg))
        .with_money_manager(Box::new(FixedQuantityMoneyManager::new(100.0)))
        .with_trade_manager(Box::new(tm))
        .with_slippage(Box::new(NoSlippage));

    ts.run(&series).unwrap();

    assert_eq!(ts.trade_list().len(), 2);
    let entry = &ts.trade_list()[0];
    assert_eq!(entry.business, Business::SellShort);
    assert_eq!(entry.part, Part::SellSignal);
    assert_eq!(entry.datetime, series[6].datetime);
    assert!(ts.is_holding_short());

    let exit = &ts.trade_list()[1];
    assert_eq!(exit.business, Business::BuyShort);
    assert_eq!(exit.part, Part::BuySignal);
    assert_eq!(exit.datetime, series[9].datetime);
    assert!(!ts.is_holding_short());
}

/// `ready_for_run` fails cleanly, and `run()` propagates that failure
/// instead of panicking, when a required plugin is missing.
#[test]
fn run_without_trade_manager_is_a_reported_no_op() {
    let series: Vec<KRecord> = (0..3).map(|i| flat_bar(i, 100.0)).collect();
    let mut ts = TradingSystem::new(stock())
        .with_signal(Box::new(AlwaysBuySignal))
        .with_money_manager(Box::new(FixedQuantityMoneyManager::new(100.0)));

    let result = ts.run(&series);
    assert!(result.is_err());
}

/// `set_param` surface: unknown keys and wrong value types are hard errors.
#[test]
fn set_param_validates_keys_and_types() {
    let mut ts = TradingSystem::new(stock());
    assert!(ts.set_param("max_delay_count", ParamValue::Int(5)).is_ok());
    assert_eq!(ts.config().max_delay_count, 5);
    assert!(ts.set_param("not_a_param", ParamValue::Bool(true)).is_err());
    assert!(ts.set_param("delay", ParamValue::Int(1)).is_err());
}
