//! ハードウェア初期化モジュール
//!
//! クロック設定とペリフェラルの初期化ロジックを集約します。

use embassy_stm32::{
    gpio::OutputType,
    peripherals,
    timer::{
        complementary_pwm::{ComplementaryPwm, ComplementaryPwmPin},
        low_level::CountingMode,
        simple_pwm::PwmPin,
        Channel,
    },
    Config, Peri,
};

use crate::config;

/// RCCクロック設定を初期化
///
/// HSI → PLL（÷4 × 85 ÷ 2）で170MHz生成
pub fn create_clock_config() -> Config {
    let mut config = Config::default();
    {
        use embassy_stm32::rcc::mux::{Adcsel, ClockMux};
        use embassy_stm32::rcc::{Pll, PllMul, PllPreDiv, PllRDiv, PllSource, Sysclk};

        config.rcc.hsi = true;
        config.rcc.pll = Some(Pll {
            source: PllSource::HSI,
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL85,
            divp: None,
            divq: None,
            divr: Some(PllRDiv::DIV2),
        });
        config.rcc.sys = Sysclk::PLL1_R; // システムクロックをPLLに設定

        let mut clock_mux = ClockMux::default();
        clock_mux.adc12sel = Adcsel::SYS;
        config.rcc.mux = clock_mux;
    }
    config
}

/// TIM1 3相相補PWMを初期化
///
/// U: PE9/PE8, V: PE11/PE10, W: PE13/PE12（センターアライン）
/// 出力は無効のまま返し、ドライバ有効化時に開放します。
#[allow(clippy::too_many_arguments)]
pub fn init_pwm(
    tim: Peri<'static, peripherals::TIM1>,
    uh: Peri<'static, peripherals::PE9>,
    ul: Peri<'static, peripherals::PE8>,
    vh: Peri<'static, peripherals::PE11>,
    vl: Peri<'static, peripherals::PE10>,
    wh: Peri<'static, peripherals::PE13>,
    wl: Peri<'static, peripherals::PE12>,
) -> ComplementaryPwm<'static, peripherals::TIM1> {
    let mut pwm = ComplementaryPwm::new(
        tim,
        Some(PwmPin::new(uh, OutputType::PushPull)),
        Some(ComplementaryPwmPin::new(ul, OutputType::PushPull)),
        Some(PwmPin::new(vh, OutputType::PushPull)),
        Some(ComplementaryPwmPin::new(vl, OutputType::PushPull)),
        Some(PwmPin::new(wh, OutputType::PushPull)),
        Some(ComplementaryPwmPin::new(wl, OutputType::PushPull)),
        None,
        None,
        config::pwm::FREQUENCY,
        CountingMode::CenterAlignedBothInterrupts,
    );
    pwm.disable(Channel::Ch1);
    pwm.disable(Channel::Ch2);
    pwm.disable(Channel::Ch3);
    pwm.set_dead_time(config::pwm::DEAD_TIME);

    // ブレーキパターン（50%）で待機
    let half = pwm.get_max_duty() / 2;
    pwm.set_duty(Channel::Ch1, half);
    pwm.set_duty(Channel::Ch2, half);
    pwm.set_duty(Channel::Ch3, half);
    pwm
}
