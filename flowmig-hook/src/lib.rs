pub mod dispatcher;
pub mod event;
pub mod handler;

pub use dispatcher::MigrationEventDispatcher;
pub use event::MigrationEvent;
pub use handler::MigrationEventHandler;

pub mod impls {
    pub mod log_hook;
}
