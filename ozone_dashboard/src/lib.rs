//! # Ozone Dashboard
//!
//! Interactive dashboard over a pre-trained Prophet model of ozone (O3)
//! concentrations. The user picks a horizon in days, presses "Predict", and
//! gets an interactive chart, a table of daily estimates and a CSV export.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ozone_dashboard::presentation::{render, View};
//! use ozone_dashboard::session::SessionState;
//! use prophet_forecast::{load_model, Horizon};
//!
//! let model = load_model("model_03_prophet.json")?;
//! let mut session = SessionState::new();
//! session.predict(&model, Horizon::new(3)?, 0);
//!
//! if let View::Forecast(view) = render(&model, &session)? {
//!     print!("{}", view.csv);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod chart;
pub mod config;
pub mod error;
pub mod page;
pub mod presentation;
pub mod server;
pub mod session;

pub use crate::config::{Cli, Command, Config};
pub use crate::error::{DashboardError, Result};
pub use crate::presentation::{render, DisplayTable, View};
pub use crate::server::{router, serve, AppState};
pub use crate::page::PageRenderer;
pub use crate::session::{SessionState, SessionStore};
