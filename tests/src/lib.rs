mod enumeration;
mod liveness;
mod pipeline;
mod util;
