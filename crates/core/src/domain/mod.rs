pub mod factor;
pub mod rating;
pub mod recommendation;
pub mod score;
pub mod weights;
