mod model_loaders;

pub use model_loaders::{load_action_middleware, load_task_middleware};
