/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::process::ExitCode;

use lexigraph::cli::{cli, local_today, run};

fn main() -> ExitCode {
    let args = cli().run();
    // Read the local offset while the process is still single-threaded.
    let today = local_today();
    lexigraph::init_tracing(args.log.as_deref());

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        },
    };

    match runtime.block_on(run(args, today)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        },
    }
}
