pub mod visitor;

pub use visitor::Entity as VisitorEntity;
