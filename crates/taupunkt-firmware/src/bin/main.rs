#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex as AsyncMutex;
use embassy_time::Delay;
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use rtt_target::rprintln;
use static_cell::StaticCell;

// Display-LCD panel specific imports
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use mipidsi::interface::SpiInterface;
use mipidsi::{Builder as MipidsiBuilder, models::ST7789};

use taupunkt_core::bus::SharedI2c;
use taupunkt_core::config::{self, MonitorConfig};
use taupunkt_core::display::{DISPLAY_HEIGHT, DISPLAY_WIDTH, Dashboard};
use taupunkt_core::leds::StatusLeds;
use taupunkt_core::monitor::Monitor;
use taupunkt_core::sensors::{Aht20, Bmp280, CachedSensor, Sht41};
use taupunkt_firmware::bus::MonitorBus;
use taupunkt_firmware::watchdog::RtcWatchdog;

// Panel column offset of the 1.47" ST7789 module (172 of 240 columns used).
const DISPLAY_COL_OFFSET: u16 = 34;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    esp_alloc::heap_allocator!(size: 65536);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    rprintln!("Embassy initialized");

    // Watchdog first: from here on a hang anywhere resets the device.
    let watchdog = RtcWatchdog::new(esp_hal::rtc_cntl::Rtc::new(peripherals.LPWR));

    // Shared I2C bus for all three sensors, standard mode.
    let i2c_config =
        I2cConfig::default().with_frequency(Rate::from_khz(config::BUS_FREQUENCY_KHZ));
    let i2c = I2c::new(peripherals.I2C0, i2c_config.clone())
        .unwrap()
        .with_sda(peripherals.GPIO8)
        .with_scl(peripherals.GPIO9)
        .into_async();

    static I2C_BUS: StaticCell<AsyncMutex<CriticalSectionRawMutex, MonitorBus>> =
        StaticCell::new();
    let i2c_bus = I2C_BUS.init(AsyncMutex::new(MonitorBus::new(i2c, i2c_config)));

    // Advisory LEDs: red, yellow, green.
    let leds = StatusLeds::new(
        Output::new(peripherals.GPIO13, Level::Low, OutputConfig::default()),
        Output::new(peripherals.GPIO14, Level::Low, OutputConfig::default()),
        Output::new(peripherals.GPIO15, Level::Low, OutputConfig::default()),
    );

    // Configure and initialize the display

    // 1. Configure SPI bus
    let spi_bus = Spi::new(peripherals.SPI2, SpiConfig::default())
        .unwrap()
        .with_sck(peripherals.GPIO36)
        .with_mosi(peripherals.GPIO37);

    // 2. Chip select and data/command pins
    let cs = Output::new(peripherals.GPIO35, Level::High, OutputConfig::default());
    let spi_device = ExclusiveDevice::new_no_delay(spi_bus, cs).unwrap();
    let dc = Output::new(peripherals.GPIO34, Level::Low, OutputConfig::default());

    // 3. Buffer for SPI batching (larger = faster, uses more RAM)
    let mut spi_buffer = [0u8; 512];
    let di = SpiInterface::new(spi_device, dc, &mut spi_buffer);

    // 4. Build and initialize the panel driver
    let reset = Output::new(peripherals.GPIO33, Level::High, OutputConfig::default());
    let display = MipidsiBuilder::new(ST7789, di)
        .display_size(DISPLAY_WIDTH, DISPLAY_HEIGHT)
        .display_offset(DISPLAY_COL_OFFSET, 0)
        .reset_pin(reset)
        .init(&mut Delay)
        .expect("Failed to initialize display");

    let _backlight = Output::new(peripherals.GPIO38, Level::High, OutputConfig::default());

    rprintln!("Display initialized");

    // Sensor drivers. The AHT20 and BMP280 constructors talk to the
    // hardware; a sensor that cannot complete its bring-up is fatal here
    // and the resulting reset is the retry.
    let indoor = Sht41::new(SharedI2c::new(i2c_bus), Delay);
    let outdoor = Aht20::new(SharedI2c::new(i2c_bus), Delay)
        .await
        .expect("AHT20 failed initialization");
    let pressure = Bmp280::new(SharedI2c::new(i2c_bus))
        .await
        .expect("BMP280 calibration read failed");

    rprintln!("Sensors initialized");

    let mut monitor = Monitor::new(
        CachedSensor::new(indoor, "SHT41", config::CACHE_WINDOW),
        CachedSensor::new(outdoor, "AHT20", config::CACHE_WINDOW),
        CachedSensor::new(pressure, "BMP280", config::CACHE_WINDOW),
        watchdog,
        leds,
        Dashboard::new(display),
        Delay,
        MonitorConfig::default(),
    );
    monitor.run().await
}
