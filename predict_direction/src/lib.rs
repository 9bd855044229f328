pub mod alignment;
pub mod config;
pub mod dataset;
pub mod evaluation;
pub mod pipeline;
pub mod report;
pub mod summary;
pub mod training;

pub use alignment::{AlignedPredictions, PredictionRow, align_predictions};
pub use config::Config;
pub use dataset::{Dataset, Direction, FEATURE_NAMES, build_dataset, compute_targets};
pub use evaluation::{ClassificationReport, write_results};
pub use pipeline::{
    PipelineError, PipelineOptions, PipelineOutcome, PipelineReport, PipelineRequest, run_pipeline,
};
pub use report::{write_json_report, write_predictions_csv};
pub use summary::IndicatorSummary;
pub use training::{SplitStrategy, TrainingResult, train_and_evaluate};
