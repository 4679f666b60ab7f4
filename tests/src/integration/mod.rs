//! Cross-subsystem flows.

#[cfg(test)]
mod dispatch_flow;
#[cfg(test)]
mod http_flow;
#[cfg(test)]
mod registration_flow;
