// Document clustering: partitioning TF-IDF rows into k groups.

pub mod kmeans;
pub mod traits;

pub use kmeans::KMeans;
pub use traits::{ClusterAssignment, Clusterer};
