#![no_main]
#![no_std]

extern crate cortex_m;
extern crate cortex_m_rt as rt;

use rt::entry;
use core::fmt::Write;

use stm32g0xx_hal::{
    prelude::*,
    stm32::{self, interrupt},
    serial::Config,
    timer,
    i2c,
};

use stm32g0xx_hal::rcc::{Config as RCCConfig, Prescaler};
use cortex_m::interrupt::Mutex;
use core::{cell::RefCell, ops::DerefMut, cell::UnsafeCell};

use heapless::{consts::U64, String};
use vl6180x::VL6180X;

use embedded_hal::digital::v2::OutputPin;

use lapgate::{DetectorConfig, Event, GateController};
#[cfg(feature = "raw_records")]
use lapgate::EventRecord;

mod config;

mod counter;
use counter::CSCounter;


static TIME_MS: CSCounter<u32> = CSCounter(UnsafeCell::new(0));
static TIMER1: Mutex<RefCell<Option<timer::Timer<stm32::TIM1>>>> = Mutex::new(RefCell::new(None));

/// Fixed sampling interval of the ranging loop
const SAMPLE_INTERVAL_MS: u16 = 50;

use core::panic::PanicInfo;
use core::ptr;
use core::sync::atomic::{self, Ordering};

#[inline(never)]
#[panic_handler]
fn panic(_info: &PanicInfo) -> ! {
    const GPIOB_BSRR: *mut u32 = 0x5000_0418 as *mut u32;
    const ON: u32 = 1_000;
    const OFF: u32 = 20_000;
    loop {

        unsafe {

            // turn on red led
            ptr::write_volatile(GPIOB_BSRR, 1 << 5);

            for _i in 1..ON {
                atomic::compiler_fence(Ordering::SeqCst);
            }

            // turn off red led
            ptr::write_volatile(GPIOB_BSRR, 1 << 21);

            for _i in 1..OFF {
                atomic::compiler_fence(Ordering::SeqCst);
            }

        }
    }
}


#[entry]
fn main() -> ! {

    let cp = cortex_m::Peripherals::take().unwrap();
    let dp = stm32::Peripherals::take().expect("cannot take peripherals");

    let mut rcc = dp.RCC.freeze(RCCConfig::hsi(Prescaler::Div16));

    let mut delay = cp.SYST.delay(&mut rcc);

    let gpioa = dp.GPIOA.split(&mut rcc);
    let gpiob = dp.GPIOB.split(&mut rcc);

    let mut led1 = gpiob.pb5.into_push_pull_output(); // red: lap completed
    let mut led2 = gpiob.pb9.into_push_pull_output(); // green: calibrating

    led1.set_low().unwrap();
    led2.set_high().unwrap();

    let mut usart = {
        let tx = gpioa.pa9;
        let rx = gpioa.pa10;
        dp.USART1
        .usart(tx, rx, Config::default().baudrate(115200.bps()), &mut rcc)
        .unwrap()
    };

    writeln!(usart, "Start lapgate!\n").unwrap();

    // Configure the timer.
    let mut timer = dp.TIM1.timer(&mut rcc);
    timer.start(1.khz());
    timer.listen();

    cortex_m::interrupt::free(|cs| {
        *TIMER1.borrow(cs).borrow_mut() = Some(timer);
    });

    // I2C pins
    let scl = gpiob.pb6.into_open_drain_output();
    let sda = gpiob.pb7.into_open_drain_output();

    let i2c = dp
        .I2C1
        // for sys_clk = 1MHz => 400kHz
        .i2c(sda, scl, i2c::Config::with_timing(0x00000000), &mut rcc);

    let mut vl6180x = VL6180X::new(i2c).expect("vl6180x failed to intialize");
    writeln!(usart, "VL6180X init done..\n").unwrap();

    let mut gate = match GateController::new(config::from_env()) {
        Ok(gate) => gate,
        Err(err) => {
            writeln!(usart, "Invalid build configuration ({}), using defaults", err).unwrap();
            GateController::new(DetectorConfig::default()).unwrap()
        }
    };
    let c = gate.detector().config();
    writeln!(usart, "window: {}, detection: {}, trigger: {}%, delay: {} ms",
        c.window_size,
        c.detection_size,
        c.percent_diff_trigger,
        c.after_detection_delay_ms
    ).unwrap();

    writeln!(usart, "Enable timer..\n").unwrap();

    #[allow(unsafe_code)]
    unsafe {
        stm32::NVIC::unmask(stm32::Interrupt::TIM1_BRK_UP_TRG_COMP);
    }

    gate.start();
    writeln!(usart, "start detector loop\n").unwrap();

    let mut line: String<U64> = String::new();

    loop {

        vl6180x.start_ranging().unwrap();
        delay.delay_ms(SAMPLE_INTERVAL_MS);

        let status = vl6180x.int_status().unwrap();
        if (status & 0b100) != 0b100 {
            // no new range sample this cycle
            continue;
        }
        let range = vl6180x.read_range().unwrap();
        vl6180x.clear_int().unwrap();

        let t: u32 = TIME_MS.get();
        let events = match gate.poll(range as i32, t) {
            Some(events) => events,
            None => continue,
        };

        for event in events.iter() {
            line.clear();
            // line buffer only truncates, never fails the loop
            write!(line, "{} {} mm {}", t, range, event).ok();
            writeln!(usart, "{}", line).unwrap();

            #[cfg(feature = "raw_records")]
            {
                let mut buf = [0u8; EventRecord::MAX_SIZE];
                match EventRecord::new(t, *event).encode(&mut buf) {
                    Ok(frame) => {
                        for b in frame.iter() {
                            write!(usart, "{:02x}", b).unwrap();
                        }
                        writeln!(usart).unwrap();
                    }
                    Err(err) => writeln!(usart, "error while encoding record: {:?}", err).unwrap(),
                }
            }

            match event {
                Event::Calibrating { filled, total } if filled == total => {
                    led2.set_low().unwrap();
                }
                Event::Match { .. } => {
                    led1.set_high().unwrap();
                    writeln!(usart, "laps: {}, best: {:?} ms",
                        gate.lap_count(),
                        gate.best_lap_ms()
                    ).unwrap();
                }
                _ => {}
            }
        }

        // hold off sampling after a lap
        if let Some(remaining) = gate.cooldown_remaining_ms(TIME_MS.get()) {
            delay.delay_ms(remaining);
            led1.set_low().unwrap();
        }
    }
}



#[interrupt]
fn TIM1_BRK_UP_TRG_COMP() {
    cortex_m::interrupt::free(|cs| {
        if let Some(ref mut tim1) = TIMER1.borrow(cs).borrow_mut().deref_mut() {
            tim1.clear_irq();
            // count 1 millisecond
            TIME_MS.increment(cs);
        }
    });
}
