//! Session-level tests driving a whole bridge through `dispatch`.

mod behaviour;
mod support;
