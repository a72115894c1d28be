#![no_std]
#![no_main]

// Required for ESP-IDF bootloader compatibility
// Use explicit parameters to ensure correct efuse block revision values
esp_bootloader_esp_idf::esp_app_desc!(
    env!("CARGO_PKG_VERSION"),  // version
    env!("CARGO_PKG_NAME"),     // project_name
    "00:00:00",                 // build_time
    "2025-01-01",               // build_date
    "0.0.0",                    // idf_ver (not using IDF)
    0x10000,                    // mmu_page_size (64KB)
    0,                          // min_efuse_blk_rev_full (accept all)
    u16::MAX                    // max_efuse_blk_rev_full (accept all)
);

use embassy_executor::Spawner;
use esp_backtrace as _;
use esp_hal::gpio::{AnyPin, Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::timer::timg::TimerGroup;
use esp_hal::uart::{Config as UartConfig, Uart, UartRx, UartTx};
use esp_hal::Async;
use static_cell::StaticCell;

use fingerprint_terminal_firmware::config::serial::BAUD_RATE;
use fingerprint_terminal_firmware::protocol::AckMailbox;
use fingerprint_terminal_firmware::sensor::{Fingerprint, UartSensorLink};
use fingerprint_terminal_firmware::sequencer::Sequencer;
use fingerprint_terminal_firmware::session::SharedSession;
use fingerprint_terminal_firmware::tasks::{
    self, ChannelFeedback, ChannelKeypad, FeedbackReceiver, KeySender, MatrixKeypad, FEEDBACK_CHANNEL,
    KEY_CHANNEL,
};
use fingerprint_terminal_firmware::terminal::Terminal;
use fingerprint_terminal_firmware::users::UserTable;

/// Static executor for embassy
static EXECUTOR: StaticCell<esp_rtos::embassy::Executor> = StaticCell::new();

/// Acknowledgments from the sensor, filled by the sensor receive task
static ACK_MAILBOX: AckMailbox = AckMailbox::new();

/// Mode and latched slot, updated by the control receive task
static SESSION: SharedSession = SharedSession::new();

type Keypad = MatrixKeypad<Output<'static>, Input<'static>>;

/// Keypad row: driven, idle high
fn keypad_row(pin: AnyPin<'static>) -> Output<'static> {
    Output::new(pin, Level::High, OutputConfig::default())
}

/// Keypad column: pulled up, low while a key in the driven row is held
fn keypad_col(pin: AnyPin<'static>) -> Input<'static> {
    Input::new(pin, InputConfig::default().with_pull(Pull::Up))
}

#[esp_hal::main]
fn main() -> ! {
    esp_println::logger::init_logger(log::LevelFilter::Info);

    let peripherals = esp_hal::init(esp_hal::Config::default());

    // Status output idles high (active low on a match)
    let status = Output::new(peripherals.GPIO48, Level::High, OutputConfig::default());

    // Initialise the RTOS scheduler with timer - MUST be done before any async operations
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Fingerprint sensor link
    let sensor_uart = Uart::new(peripherals.UART1, UartConfig::default().with_baudrate(BAUD_RATE))
        .unwrap()
        .with_tx(peripherals.GPIO17)
        .with_rx(peripherals.GPIO18)
        .into_async();
    let (sensor_rx, sensor_tx) = sensor_uart.split();

    // Control channel from the host
    let control_uart = Uart::new(peripherals.UART0, UartConfig::default().with_baudrate(BAUD_RATE))
        .unwrap()
        .with_tx(peripherals.GPIO43)
        .with_rx(peripherals.GPIO44)
        .into_async();
    let (control_rx, control_tx) = control_uart.split();

    let keypad = MatrixKeypad::new(
        [
            keypad_row(peripherals.GPIO4.into()),
            keypad_row(peripherals.GPIO5.into()),
            keypad_row(peripherals.GPIO6.into()),
            keypad_row(peripherals.GPIO7.into()),
        ],
        [
            keypad_col(peripherals.GPIO15.into()),
            keypad_col(peripherals.GPIO16.into()),
            keypad_col(peripherals.GPIO8.into()),
            keypad_col(peripherals.GPIO9.into()),
        ],
    );

    log::info!("Fingerprint terminal starting");

    // Create and run the embassy executor
    let executor = EXECUTOR.init(esp_rtos::embassy::Executor::new());
    executor.run(|spawner| {
        spawner.must_spawn(async_main(
            spawner, sensor_rx, sensor_tx, control_rx, control_tx, status, keypad,
        ));
    })
}

#[embassy_executor::task]
async fn async_main(
    spawner: Spawner,
    sensor_rx: UartRx<'static, Async>,
    sensor_tx: UartTx<'static, Async>,
    control_rx: UartRx<'static, Async>,
    control_tx: UartTx<'static, Async>,
    status: Output<'static>,
    keypad: Keypad,
) {
    // Spawn tasks
    spawner.spawn(sensor_rx_task(sensor_rx)).unwrap();
    spawner.spawn(control_rx_task(control_rx)).unwrap();
    spawner.spawn(feedback_writer_task(control_tx, status, FEEDBACK_CHANNEL.receiver())).unwrap();
    spawner.spawn(keypad_task(keypad, KEY_CHANNEL.sender())).unwrap();

    let sensor = Fingerprint::new(UartSensorLink::new(sensor_tx, &ACK_MAILBOX));
    let feedback = ChannelFeedback::new(FEEDBACK_CHANNEL.sender());
    let sequencer = Sequencer::new(sensor, feedback);
    let keypad = ChannelKeypad::new(KEY_CHANNEL.receiver());

    let mut terminal = Terminal::new(sequencer, keypad, UserTable::seeded(), &SESSION);
    terminal.run().await;
}

/// Task that feeds sensor replies into the mailbox
#[embassy_executor::task]
async fn sensor_rx_task(reader: UartRx<'static, Async>) {
    tasks::sensor_rx_task(reader, &ACK_MAILBOX).await;
}

/// Task that applies control bytes to the session
#[embassy_executor::task]
async fn control_rx_task(reader: UartRx<'static, Async>) {
    tasks::control_rx_task(reader, &SESSION).await;
}

/// Task that writes feedback to the control channel
#[embassy_executor::task]
async fn feedback_writer_task(
    writer: UartTx<'static, Async>,
    status: Output<'static>,
    receiver: FeedbackReceiver,
) {
    tasks::feedback_writer_task(writer, status, receiver).await;
}

/// Task that scans the keypad matrix
#[embassy_executor::task]
async fn keypad_task(keypad: Keypad, sender: KeySender) {
    tasks::keypad_task(keypad, sender).await;
}
