mod config_file;
mod http_engine;
mod parent_child;
mod propagation;
mod reindex;
mod search;
