use std::env;

fn main() {
	println!("cargo:rerun-if-env-changed=HC_BROWSER_LIB_DIR");

	if env::var_os("CARGO_FEATURE_NATIVE").is_none() {
		return;
	}

	if let Some(dir) = env::var_os("HC_BROWSER_LIB_DIR") {
		println!("cargo:rustc-link-search=native={}", dir.to_string_lossy());
	} else {
		println!(
			"cargo:warning=HC_BROWSER_LIB_DIR is not set; relying on the default linker search path for libhc_browser"
		);
	}
}
