use thiserror::Error;

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("malformed descriptor: {0}")]
    Malformed(String),

    #[error("descriptor XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("pipeline YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unknown data type '{0}'")]
    UnknownType(String),
}

pub type Result<T> = std::result::Result<T, DescriptorError>;
