// Copyright (C) 2016-2018 ERGO-Code
// Copyright (C) 2022-2023 Richard Lincoln

mod check;
mod data;
mod def;
mod factorization;
mod file;
mod pfi;
mod replace;
mod solve_l;
mod solve_r;
mod solve_u;
mod space;
mod sparse;
mod stats;
mod update_column;
mod work;

pub use data::FactorData;
pub use def::{
    choose_r_strategy, choose_u_strategy, r_strategy_costs, CostWeights, RCostInput, RStrategy,
    UStrategy,
};
pub use factorization::Factorization;
pub use stats::FactorStats;
