fn main() {
    println!("cargo:rerun-if-changed=schema/hypersync_net_types.capnp");

    capnpc::CompilerCommand::new()
        .src_prefix("schema")
        .file("schema/hypersync_net_types.capnp")
        .run()
        .expect("compiling schema/hypersync_net_types.capnp");
}
