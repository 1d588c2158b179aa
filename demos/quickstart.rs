//! Quickstart demonstrating the price and volatility workflows of anofox-fints.
//!
//! Run with: cargo run --example quickstart

use anofox_fints::core::TimeSeries;
use anofox_fints::models::arima::{ArimaEstimator, ArimaForecaster, ArimaOrder};
use anofox_fints::models::garch::{
    GarchEstimator, GarchForecaster, GarchOrder, GarchParams, MeanSpec, VolatilityMethod,
};
use anofox_fints::models::{Estimator, FittedModel};
use anofox_fints::transform::{difference_series, percent_returns_series};
use anofox_fints::utils::{evaluate, realized_volatility};
use anofox_fints::validation::{jarque_bera, ljung_box, StationarityTester};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;

const HOLDOUT: usize = 30;

fn main() {
    println!("=== anofox-fints Quickstart ===\n");

    // 1. One year of business-day prices driven by GARCH shocks
    let shocks = GarchParams::new(0.02, vec![0.08], vec![0.9])
        .unwrap()
        .simulate(252, &mut StdRng::seed_from_u64(7));
    let mut price = 100.0;
    let prices: Vec<f64> = shocks
        .iter()
        .map(|r| {
            price *= 1.0 + (0.03 + r) / 100.0;
            price
        })
        .collect();
    let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let series = TimeSeries::from_business_days(start, prices)
        .unwrap()
        .with_label("SIM");
    println!(
        "Created {} observations from {} to {}",
        series.len(),
        series.first_timestamp().unwrap(),
        series.last_timestamp().unwrap()
    );

    // 2. Stationarity
    println!("\n--- Augmented Dickey-Fuller ---");
    let tester = StationarityTester::new();
    let levels = tester.test(&series).unwrap();
    println!(
        "levels: stat {:.4}, p-value {:.4}, lags {}",
        levels.statistic, levels.p_value, levels.lags
    );
    let diffs = tester
        .test(&difference_series(&series, 1).unwrap())
        .unwrap();
    println!(
        "first differences: stat {:.4}, p-value {:.4}",
        diffs.statistic, diffs.p_value
    );

    // 3. ARIMA(1,1,1) on the training prices
    println!("\n--- ARIMA(1,1,1) ---");
    let (train, test) = series.train_test_split(HOLDOUT).unwrap();
    let arima = ArimaEstimator::new(ArimaOrder::new(1, 1, 1))
        .fit(&train)
        .unwrap();
    println!("AR: {:?}", arima.ar_coefficients());
    println!("MA: {:?}", arima.ma_coefficients());
    println!("sigma2: {:.6}", arima.sigma2());
    println!("AIC: {:.2}  BIC: {:.2}", arima.aic(), arima.bic());
    let lb = ljung_box(arima.residuals(), 10, 2).unwrap();
    let jb = jarque_bera(arima.residuals()).unwrap();
    println!(
        "Ljung-Box(10) p = {:.4}, Jarque-Bera p = {:.4}",
        lb.p_value, jb.p_value
    );

    let forecast = ArimaForecaster::default().forecast(&arima, HOLDOUT).unwrap();
    println!(
        "\n{:>12} {:>10} {:>10} {:>10}",
        "date", "lower", "forecast", "upper"
    );
    println!("{:-<45}", "");
    for row in forecast.rows().take(5) {
        println!(
            "{:>12} {:>10.4} {:>10.4} {:>10.4}",
            row.timestamp,
            row.lower.unwrap_or(f64::NAN),
            row.point,
            row.upper.unwrap_or(f64::NAN)
        );
    }
    let report = evaluate(test.values(), forecast.point()).unwrap();
    println!("holdout MAE {:.4}, RMSE {:.4}", report.mae, report.rmse);

    // 4. GARCH(1,1) on percent returns
    println!("\n--- GARCH(1,1) ---");
    let returns = percent_returns_series(&series).unwrap();
    let (train, test) = returns.train_test_split(HOLDOUT).unwrap();
    let garch = GarchEstimator::new(MeanSpec::Constant, GarchOrder::new(1, 1))
        .fit(&train)
        .unwrap();
    println!(
        "mu {:.4}, omega {:.4}, alpha {:?}, beta {:?}",
        garch.mean().mu,
        garch.omega(),
        garch.alpha(),
        garch.beta()
    );
    println!(
        "persistence {:.4}, long-run volatility {:.4}",
        garch.persistence(),
        garch.unconditional_variance().sqrt()
    );

    let volatility = GarchForecaster::new(VolatilityMethod::Simulation {
        simulations: 1000,
        seed: 42,
    })
    .forecast(&garch, HOLDOUT)
    .unwrap();
    for (date, vol) in volatility.rows().take(5) {
        println!("  {}: {:.4}", date, vol);
    }
    let realized = realized_volatility(test.values());
    let report = evaluate(&realized, &volatility.volatility()).unwrap();
    println!(
        "volatility holdout MAE {:.4}, RMSE {:.4}",
        report.mae, report.rmse
    );
}
