pub mod match_flow;
pub mod pricing_flow;

pub use match_flow::handle_match;
pub use pricing_flow::handle_pricing;
