/// Reader abstraction shared by every input of the toolkit.
pub mod item;
