pub mod get_frontends;
