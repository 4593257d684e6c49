//! ベンチマークモジュール
//!
//! 三角関数の実装と制御周期1回分の処理時間を測定します。

use core::hint::black_box;

use cortex_m::peripheral::DWT;
use foc_drive::foc::transforms::{cos_sin_idsp, cos_sin_libm};

/// DWTサイクルカウンタを有効化
///
/// # Safety
/// Cortex-Mペリフェラルへの直接アクセスを含む
pub unsafe fn enable_cycle_counter() {
    let mut cp = cortex_m::Peripherals::steal();
    cp.DCB.enable_trace();
    cp.DWT.enable_cycle_counter();
}

/// 指定した関数を `iterations` 回実行したサイクル数と最後の結果
fn measure(iterations: u32, f: fn(f32) -> (f32, f32)) -> (u32, (f32, f32)) {
    let mut result = (0.0, 0.0);
    let start = DWT::cycle_count();
    for i in 0..iterations {
        // 0〜2πを粗く掃引
        let theta = (i % 628) as f32 * 0.01;
        result = f(black_box(theta));
    }
    (DWT::cycle_count().wrapping_sub(start), result)
}

/// cos_sin()の実装比較ベンチマークを実行して結果を表示
///
/// # 引数
/// * `iterations` - ベンチマーク実行回数
pub fn run_cos_sin_benchmark(iterations: u32) {
    info!("Running cos_sin() benchmark...");

    let (ticks_idsp, result_idsp) = measure(iterations, cos_sin_idsp);
    let (ticks_libm, result_libm) = measure(iterations, cos_sin_libm);

    // サイクル/呼び出し を計算（整数に変換してdefmtで表示）
    let cycles_per_call_idsp = (ticks_idsp / iterations).max(1);
    let cycles_per_call_libm = ticks_libm / iterations;
    let speedup_x10 = (cycles_per_call_libm * 10) / cycles_per_call_idsp; // 10倍してdefmtで表示

    info!("Benchmark results ({} iterations):", iterations);
    info!(
        "  idsp::cossin():  {} cycles total, {} cycles/call",
        ticks_idsp, cycles_per_call_idsp
    );
    info!(
        "  libm::cosf/sinf: {} cycles total, {} cycles/call",
        ticks_libm, cycles_per_call_libm
    );
    info!(
        "  Speedup: {}.{}x faster with idsp",
        speedup_x10 / 10,
        speedup_x10 % 10
    );
    info!(
        "  Error: cos={}, sin={}",
        result_idsp.0 - result_libm.0,
        result_idsp.1 - result_libm.1
    );
}
