pub mod artifact;
pub mod classifier;
pub mod dataset;
pub mod forest;
pub mod scaler;
pub mod smote;
pub mod trainer;

pub use artifact::ArtifactPair;
pub use classifier::{Prediction, ProfessionalClassifier};
pub use dataset::{load_dataset, LabeledDataset};
pub use forest::{ForestConfig, RandomForest};
pub use scaler::StandardScaler;
pub use smote::SmoteConfig;
pub use trainer::{fit_pair, train, TrainerConfig, TrainingReport};
