use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use simproc::{log_debug, log_info, Request, Resource, Simulation, SimulationContext};

const CUSTOMERS: usize = 5;
const SERVICE_TIME: f64 = 3.0;
// How often the idle clerk looks at the line
const CHECK_INTERVAL: f64 = 0.5;

async fn customer(ctx: SimulationContext, clerk: Resource, line: Rc<RefCell<VecDeque<Request>>>, arrival: f64) {
    ctx.sleep(arrival).await;
    let request = clerk.request();
    line.borrow_mut().push_back(request.clone());
    log_info!(ctx, "joins the line ({} waiting)", line.borrow().len());
    let since = ctx.time();
    ctx.wait(&request).await;
    log_info!(ctx, "is served after waiting {:.3}", ctx.time() - since);
}

async fn clerk(ctx: SimulationContext, line: Rc<RefCell<VecDeque<Request>>>) {
    let mut served = 0;
    while served < CUSTOMERS {
        let next = line.borrow_mut().pop_front();
        match next {
            Some(request) => {
                request.release().expect("requests in the line are pending");
                log_debug!(ctx, "serves request {}", request.id());
                served += 1;
                ctx.sleep(SERVICE_TIME).await;
            }
            None => ctx.sleep(CHECK_INTERVAL).await,
        }
    }
    log_info!(ctx, "closes the bank");
}

fn main() {
    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "{}", record.args())
        })
        .init();

    let mut sim = Simulation::new(123);
    let counter = sim.resource(1);
    let line: Rc<RefCell<VecDeque<Request>>> = Rc::default();

    for i in 0..CUSTOMERS {
        let arrival = sim.gen_range(0.0..10.0);
        let ctx = sim.create_context(format!("customer{}", i));
        sim.spawn(customer(ctx, counter.clone(), line.clone(), arrival));
    }
    let clerk_ctx = sim.create_context("clerk");
    let closing = sim.spawn(clerk(clerk_ctx, line));

    sim.run().expect("simulation failed");

    println!("Bank closed: {}", sim.is_triggered(closing));
    println!("Processed events: {}", sim.event_count());
    println!("Simulation time: {:.2}", sim.time());
}
