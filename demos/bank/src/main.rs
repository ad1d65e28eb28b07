use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use simproc::{
    log_debug, log_info, EventId, Request, Resource, Routine, Simulation, SimulationContext, SimulationResult, Step,
    DEFAULT_PRIORITY,
};

const CUSTOMERS: usize = 5;
const SERVICE_TIME: f64 = 3.0;

// State shared between the customers and the clerk
#[derive(Default)]
struct Bank {
    line: RefCell<VecDeque<Request>>,
    // Event the idle clerk waits on, fired by the next customer joining the line
    doorbell: Cell<Option<EventId>>,
    waiting_times: RefCell<Vec<f64>>,
}

enum CustomerStage {
    Walking,
    Arriving,
    InLine { since: f64 },
}

struct Customer {
    arrival: f64,
    clerk: Resource,
    bank: Rc<Bank>,
    stage: CustomerStage,
}

impl Routine for Customer {
    fn resume(&mut self, ctx: &SimulationContext) -> SimulationResult<Step> {
        match self.stage {
            CustomerStage::Walking => {
                self.stage = CustomerStage::Arriving;
                Ok(Step::wait(ctx.timeout(self.arrival)))
            }
            CustomerStage::Arriving => {
                let request = self.clerk.request();
                self.bank.line.borrow_mut().push_back(request.clone());
                log_info!(ctx, "joins the line ({} waiting)", self.bank.line.borrow().len());
                if let Some(doorbell) = self.bank.doorbell.take() {
                    ctx.schedule(doorbell, DEFAULT_PRIORITY, 0.)?;
                }
                self.stage = CustomerStage::InLine { since: ctx.time() };
                Ok(Step::wait(request))
            }
            CustomerStage::InLine { since } => {
                let waited = ctx.time() - since;
                self.bank.waiting_times.borrow_mut().push(waited);
                log_info!(ctx, "is served after waiting {:.3}", waited);
                Ok(Step::Done)
            }
        }
    }
}

struct Clerk {
    bank: Rc<Bank>,
    served: usize,
}

impl Routine for Clerk {
    fn resume(&mut self, ctx: &SimulationContext) -> SimulationResult<Step> {
        if self.served == CUSTOMERS {
            log_info!(ctx, "closes the bank");
            return Ok(Step::Done);
        }
        let next = self.bank.line.borrow_mut().pop_front();
        match next {
            Some(request) => {
                request.release()?;
                self.served += 1;
                log_debug!(ctx, "serves request {}", request.id());
                Ok(Step::wait(ctx.timeout(SERVICE_TIME)))
            }
            None => {
                let doorbell = ctx.event();
                self.bank.doorbell.set(Some(doorbell));
                log_debug!(ctx, "waits for customers");
                Ok(Step::wait(doorbell))
            }
        }
    }
}

fn main() {
    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "{}", record.args())
        })
        .init();

    let mut sim = Simulation::new(123);
    let clerk = sim.resource(1);
    let bank = Rc::new(Bank::default());

    for i in 0..CUSTOMERS {
        let arrival = sim.gen_range(0.0..10.0);
        let ctx = sim.create_context(format!("customer{}", i));
        ctx.process(Customer {
            arrival,
            clerk: clerk.clone(),
            bank: bank.clone(),
            stage: CustomerStage::Walking,
        });
    }
    sim.create_context("clerk").process(Clerk {
        bank: bank.clone(),
        served: 0,
    });

    sim.run().expect("simulation failed");

    println!("Pending requests: {}", clerk.pending_count());
    println!("Processed events: {}", sim.event_count());
    println!("Simulation time: {:.2}", sim.time());
    let waiting_times = bank.waiting_times.borrow();
    let average = waiting_times.iter().sum::<f64>() / waiting_times.len() as f64;
    println!("Average waiting time: {:.2}", average);
}
