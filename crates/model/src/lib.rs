pub use serde_with;

pub mod call;
pub mod notification;
pub mod quota;
pub mod route;
pub mod snapshot;
pub mod subject;

pub trait ExampleData {
    fn example_data() -> Self;
}
