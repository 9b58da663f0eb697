pub mod autotile;
pub mod body;
pub mod checkpoint;
pub mod collision;
pub mod config;
pub mod controller;
pub mod draw;
pub mod editor;
pub mod entity;
pub mod error;
pub mod level;
pub mod patrol;
pub mod replay;
pub mod session;
pub mod tilemap;
pub mod watch;
