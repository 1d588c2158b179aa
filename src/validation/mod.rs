//! Statistical tests: unit roots before fitting, residual checks after.
//!
//! # Example
//!
//! ```
//! use anofox_fints::validation::{adf_test, ljung_box};
//!
//! let values: Vec<f64> = (0..120).map(|i| ((i * 53 % 97) as f64 / 48.0) - 1.0).collect();
//!
//! let adf = adf_test(&values).unwrap();
//! println!("ADF p-value: {:.4}", adf.p_value);
//!
//! let lb = ljung_box(&values, 10, 0).unwrap();
//! println!("Ljung-Box Q: {:.2}", lb.statistic);
//! ```

pub mod residuals;
pub mod stationarity;

pub use residuals::{jarque_bera, ljung_box, DiagnosticResult};
pub use stationarity::{
    adf_test, mackinnon_critical_values, mackinnon_p_value, schwert_lags, AdfRegression,
    AdfResult, CriticalValues, LagSelection, StationarityTester, DEFAULT_SIGNIFICANCE,
};
