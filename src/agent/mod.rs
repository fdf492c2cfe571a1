pub mod chat_agent;
pub mod result;
pub mod traits;

pub use chat_agent::{ChatAgent, ChatAgentFactory};
pub use result::AgentResult;
pub use traits::{Agent, AgentFactory};
