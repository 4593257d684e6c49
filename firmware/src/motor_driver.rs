//! モータードライバー抽象化レイヤー
//!
//! `foc_drive::MotorHardware` をSTM32G431のペリフェラル上に実装します。
//! TIM1相補PWM、ADC1の3相電流、ゲートドライバ有効ピン。
//! エンコーダはエンコーダタスクへ要求を出し、完了した結果だけを受け取ります。

use embassy_stm32::{
    adc::{Adc, AnyAdcChannel},
    gpio::Output,
    peripherals,
    timer::{complementary_pwm::ComplementaryPwm, Channel},
};
use foc_drive::{EncoderFault, MotorHardware, PhaseAdc};

use crate::encoder::EncoderLink;

/// 3相電流のADCチャネル
pub struct CurrentChannels {
    pub u: AnyAdcChannel<peripherals::ADC1>,
    pub v: AnyAdcChannel<peripherals::ADC1>,
    pub w: AnyAdcChannel<peripherals::ADC1>,
}

/// ボード上のモータードライバー
pub struct BoardHardware {
    pwm: ComplementaryPwm<'static, peripherals::TIM1>,
    adc: Adc<'static, peripherals::ADC1>,
    currents: CurrentChannels,
    encoder: EncoderLink,
    driver_enable: Output<'static>,
    max_duty: u16,
}

impl BoardHardware {
    pub fn new(
        pwm: ComplementaryPwm<'static, peripherals::TIM1>,
        adc: Adc<'static, peripherals::ADC1>,
        currents: CurrentChannels,
        mut driver_enable: Output<'static>,
    ) -> Self {
        driver_enable.set_low();
        let max_duty = pwm.get_max_duty();
        Self {
            pwm,
            adc,
            currents,
            encoder: EncoderLink,
            driver_enable,
            max_duty,
        }
    }

    /// PWMの最大Duty値（SVPWMの周期Ts）
    pub fn max_duty(&self) -> u16 {
        self.max_duty
    }

    fn set_duty_uvw(&mut self, duty_u: u16, duty_v: u16, duty_w: u16) {
        self.pwm.set_duty(Channel::Ch1, duty_u.min(self.max_duty));
        self.pwm.set_duty(Channel::Ch2, duty_v.min(self.max_duty));
        self.pwm.set_duty(Channel::Ch3, duty_w.min(self.max_duty));
    }
}

impl MotorHardware for BoardHardware {
    fn current_adc(&mut self) -> PhaseAdc {
        PhaseAdc {
            u: self.adc.blocking_read(&mut self.currents.u),
            v: self.adc.blocking_read(&mut self.currents.v),
            w: self.adc.blocking_read(&mut self.currents.w),
        }
    }

    fn start_encoder_read(&mut self) {
        self.encoder.start();
    }

    fn encoder_result(&mut self) -> Result<u16, EncoderFault> {
        self.encoder.result()
    }

    fn set_pwm(&mut self, u: u16, v: u16, w: u16) {
        self.set_duty_uvw(u, v, w);
    }

    fn set_pwm_brake(&mut self) {
        let half = self.max_duty / 2;
        self.set_duty_uvw(half, half, half);
    }

    fn enable_driver(&mut self) {
        self.pwm.enable(Channel::Ch1);
        self.pwm.enable(Channel::Ch2);
        self.pwm.enable(Channel::Ch3);
        self.driver_enable.set_high();
    }

    fn disable_driver(&mut self) {
        self.driver_enable.set_low();
        self.pwm.disable(Channel::Ch1);
        self.pwm.disable(Channel::Ch2);
        self.pwm.disable(Channel::Ch3);
    }
}
