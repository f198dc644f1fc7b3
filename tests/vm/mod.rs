// VM-level tests: scope resolution and delta execution
mod resolution_test {
    include!("resolution_test.rs");
}
mod delta_test {
    include!("delta_test.rs");
}
