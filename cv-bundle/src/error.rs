use core::fmt;
use thiserror::Error;

/// The kind of scene entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Camera,
    Bias,
    RigCamera,
    RigInstance,
    Shot,
    Point,
    GroundControlPoint,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::Camera => "Camera",
            Entity::Bias => "Bias",
            Entity::RigCamera => "Rig Camera",
            Entity::RigInstance => "Rig Instance",
            Entity::Shot => "Shot",
            Entity::Point => "Point",
            Entity::GroundControlPoint => "GCP",
        })
    }
}

/// Broad classification of an [`Error`], used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input data or settings cannot produce a well-posed problem.
    Configuration,
    /// The optimizer produced values which must not enter the scene.
    NumericalCorruption,
    /// An identifier did not resolve, or resolved twice.
    Scene,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("Shot {shot} has an accuracy <= 0: {accuracy}. Try modifying your input parser to filter such values.")]
    NonPositiveGpsAccuracy { shot: String, accuracy: f64 },
    #[error("{entity} {id} has no prior")]
    MissingPrior { entity: Entity, id: String },
    #[error("GCP {id} would receive a non-finite or negative standard deviation (global weight {weight})")]
    InvalidGcpWeight { id: String, weight: f64 },
    #[error("{entity} {id} has either NaN or INF values.")]
    NonFinite { entity: Entity, id: String },
    #[error("{entity} {id} does not exist")]
    UnknownEntity { entity: Entity, id: String },
    #[error("{entity} {id} already exists")]
    DuplicateEntity { entity: Entity, id: String },
    #[error("the optimizer has no value for {entity} {id}")]
    MissingResult { entity: Entity, id: String },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NonPositiveGpsAccuracy { .. }
            | Error::MissingPrior { .. }
            | Error::InvalidGcpWeight { .. } => ErrorKind::Configuration,
            Error::NonFinite { .. } => ErrorKind::NumericalCorruption,
            Error::UnknownEntity { .. }
            | Error::DuplicateEntity { .. }
            | Error::MissingResult { .. } => ErrorKind::Scene,
        }
    }

    /// The identifier of the offending entity.
    pub fn entity_id(&self) -> &str {
        match self {
            Error::NonPositiveGpsAccuracy { shot, .. } => shot,
            Error::MissingPrior { id, .. }
            | Error::InvalidGcpWeight { id, .. }
            | Error::NonFinite { id, .. }
            | Error::UnknownEntity { id, .. }
            | Error::DuplicateEntity { id, .. }
            | Error::MissingResult { id, .. } => id,
        }
    }

    pub(crate) fn unknown(entity: Entity, id: impl Into<String>) -> Self {
        Error::UnknownEntity {
            entity,
            id: id.into(),
        }
    }

    pub(crate) fn non_finite(entity: Entity, id: impl Into<String>) -> Self {
        Error::NonFinite {
            entity,
            id: id.into(),
        }
    }

    pub(crate) fn missing_result(entity: Entity, id: impl Into<String>) -> Self {
        Error::MissingResult {
            entity,
            id: id.into(),
        }
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
