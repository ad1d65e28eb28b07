use std::time::Instant;

use clap::Parser;
use log::info;

use simproc::{process, Simulation, Step};

/// Measures the event throughput of a simulation with many processes sharing a resource
#[derive(Parser, Debug)]
#[clap(about, long_about = None)]
struct Args {
    /// Number of processes
    #[clap(long, default_value_t = 1000)]
    processes: usize,

    /// Number of iterations of each process
    #[clap(long, default_value_t = 1000)]
    iterations: usize,

    /// Random seed
    #[clap(long, default_value_t = 123)]
    seed: u64,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut sim = Simulation::new(args.seed);
    let resource = sim.resource(args.processes);

    for i in 0..args.processes {
        let ctx = sim.create_context(format!("proc{}", i));
        let resource = resource.clone();
        let mut left = args.iterations;
        let mut requested = false;
        // Each iteration claims the resource, then works for a random time
        ctx.process(process::from_fn(move |ctx| {
            if requested {
                requested = false;
                return Ok(Step::wait(ctx.timeout(ctx.gen_range(0.5..1.5))));
            }
            if left == 0 {
                return Ok(Step::Done);
            }
            left -= 1;
            requested = true;
            let request = resource.request();
            request.release()?;
            Ok(Step::wait(request))
        }));
    }

    let t = Instant::now();
    sim.run().expect("simulation failed");
    let elapsed = t.elapsed().as_secs_f64();

    info!("Finished at simulation time {:.3}", sim.time());
    println!("Processed {} events in {:.2}s ({:.0} events/s)", sim.event_count(), elapsed, sim.event_count() as f64 / elapsed);
}
