pub mod matchmodel;
pub mod providermodel;
