use std::process::Command;

fn git_revision() -> String {
	Command::new("git")
	.args(["rev-parse", "--short", "HEAD"])
	.output()
	.ok()
	.filter(|out| out.status.success())
	.map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
	.unwrap_or_else(|| "unknown".to_string())
}

fn main() {
	let output = Command::new("date")
	.arg("+%Y-%m-%d %H:%M:%S")
	.output();

	let build_stamp = match output {
		Ok(out) => String::from_utf8_lossy(&out.stdout).trim().to_string(),
		Err(_) => "unknown".to_string(),
	};

	println!("cargo:rustc-env=BUILD_STAMP={}", build_stamp);
	println!("cargo:rustc-env=GIT_REVISION={}", git_revision());
	println!("cargo:rerun-if-changed=build.rs");
}
