#![allow(dead_code)]

pub mod game;
pub mod grid;
pub mod gold;
pub mod messenger;
pub mod player;
pub mod protocol;
pub mod roster;

pub mod utils {
    pub mod consts;

    pub mod prelude {
        pub use anyhow::{anyhow, Context, Error};
        pub type Result<T> = anyhow::Result<T, Error>;

        pub use super::consts::*;
        pub use std::collections::{HashMap, HashSet};
    }
}

pub mod prelude {
    pub use super::game::*;
    pub use super::grid::*;
    pub use super::gold::*;
    pub use super::messenger::*;
    pub use super::player::*;
    pub use super::protocol::*;
    pub use super::roster::*;
    pub use super::utils::prelude::*;
}
