pub mod plan;
pub mod publish;

pub use plan::{PlanPolicy, generate_clip_plan, plan_clips};
pub use publish::{IntervalPolicy, PublishScheduler, estimate_completion, randomise_interval};
