pub mod datasource;
pub mod index;
pub mod pipeline;

pub use datasource::*;
pub use index::*;
pub use pipeline::*;

use kube::ResourceExt;

/// A parent resource handed to the gateway for persistence.
#[derive(Clone, Debug)]
pub enum ParentObject {
    DataSource(XJoinDataSource),
    Index(XJoinIndex),
}

impl ParentObject {
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::DataSource(data_source) => data_source.name_any(),
            Self::Index(index) => index.name_any(),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> Option<String> {
        match self {
            Self::DataSource(data_source) => data_source.namespace(),
            Self::Index(index) => index.namespace(),
        }
    }

    #[must_use]
    pub fn resource_version(&self) -> Option<String> {
        match self {
            Self::DataSource(data_source) => data_source.resource_version(),
            Self::Index(index) => index.resource_version(),
        }
    }
}
