pub mod attacker_state;
pub mod config;
pub mod equivalence;
pub mod errors;
pub mod interning;
pub mod knowledge_map;
pub mod model;
pub mod preprocess;
pub mod pretty;
pub mod principal_state;
pub mod registry;
pub mod rewrite;
pub mod scalar;
pub mod value;

pub use config::EngineConfig;
pub use errors::{InternalError, ModelingError, PreprocessError};
pub use knowledge_map::{construct_knowledge_map, KnowledgeMap};
pub use model::{Block, Expression, ExpressionKind, MessageBlock, Model, PhaseBlock, PrincipalBlock};
pub use principal_state::{construct_principal_states, PrincipalState};
pub use value::{Constant, Declaration, Equation, Primitive, PrimitiveId, Qualifier, Value};
