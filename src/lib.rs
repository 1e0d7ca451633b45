pub mod config;
pub mod error;
pub mod fetch;
pub mod health;
pub mod mapper;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod sources;
pub mod trend;

pub use config::ApiConfig;
pub use error::{PipelineError, PipelineResult};
pub use fetch::{AnalyticsClient, FetchReport, RawSources, SourceOutcome};
pub use health::health_score;
pub use models::{CanonicalDashboardModel, DateWindow};
pub use normalize::normalize;
pub use pipeline::{build_dashboard, load_dashboard, LoadedDashboard};
pub use sources::SourceName;
pub use trend::{calc_trend, previous_window};
