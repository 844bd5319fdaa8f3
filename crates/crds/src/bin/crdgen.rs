//! Prints the Demand CRD manifest as YAML for cluster installation.

use kube::CustomResourceExt;

fn main() {
    let crd = crds::Demand::crd();
    match serde_yaml::to_string(&crd) {
        Ok(yaml) => print!("{yaml}"),
        Err(err) => {
            eprintln!("failed to render Demand CRD: {err}");
            std::process::exit(1);
        }
    }
}
