//! Binary that collects and runs the sample suite and prints deterministic
//! output lines for cross-process verification.
//!
//! Usage: `plan_fixture`
//! Output: one `plan.<test>=sha256:...` line per parametrized test, in
//! name order, then:
//!   `case_count`=N
//!   `report_digest`=sha256:...

use checkpoint_harness::config::HarnessConfig;
use checkpoint_harness::runner::run_suite;
use checkpoint_harness::suites::sample;
use checkpoint_kernel::generate::DiscoveryConfig;

fn main() {
    let config = HarnessConfig {
        discovery: DiscoveryConfig {
            verify_determinism: Some(true),
            ..DiscoveryConfig::default()
        },
        ..HarnessConfig::default()
    };
    let report = run_suite(&sample::suite(), &config);
    assert!(report.is_success(), "sample suite failed: {report:?}");

    for (test, digest) in &report.plan_digests {
        println!("plan.{test}={digest}");
    }
    println!("case_count={}", report.cases.len());
    println!(
        "report_digest={}",
        report.digest().expect("report canonicalization failed")
    );
}
