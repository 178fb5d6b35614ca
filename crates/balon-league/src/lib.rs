// League engine: roster normalization, scoring, player of the week, award
// eligibility and the one-shot award grant.

pub mod award;
pub mod grant;
pub mod ranking;
pub mod roster;
pub mod scoring;
pub mod weekly;
