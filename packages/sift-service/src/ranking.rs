mod diversity;
mod weights;

pub(crate) use diversity::apply_diversity;
pub(crate) use weights::{SCORE_EPSILON, apply_final_weights, cmp_f32_desc};
