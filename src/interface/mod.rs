pub mod render;

pub use render::{
    display_batch, display_breakdown, display_ranking, display_scorers, display_shopping_list,
    display_validation,
};
