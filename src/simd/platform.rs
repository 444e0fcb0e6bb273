/*!
 * CPU Feature Detection
 * Runtime detection of SIMD instruction sets
 */

/// Kernel dispatch level, named by vector width
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SimdLevel {
    /// Portable scalar bodies
    Scalar,
    /// 128-bit vectors (SSE2 on x86_64, NEON on aarch64)
    Simd128,
    /// 256-bit vectors (AVX2)
    Simd256,
    /// 512-bit vectors (AVX-512 F+BW+DQ+VL)
    Simd512,
}

impl SimdLevel {
    /// Vector register width in bytes (0 for scalar)
    #[inline]
    #[must_use]
    pub const fn vector_bytes(self) -> usize {
        match self {
            SimdLevel::Scalar => 0,
            SimdLevel::Simd128 => 16,
            SimdLevel::Simd256 => 32,
            SimdLevel::Simd512 => 64,
        }
    }
}

/// SIMD capabilities available on the platform
#[derive(Debug, Clone, Copy)]
pub struct CpuFeatures {
    /// SSE2 support (x86_64) - 128-bit
    pub sse2: bool,
    /// SSE4.1 packed integer min/max
    pub sse4_1: bool,
    /// AVX2 support (x86_64) - 256-bit integer ops
    pub avx2: bool,
    /// AVX-512F foundation (x86_64) - 512-bit
    pub avx512f: bool,
    /// AVX-512BW byte/word ops (x86_64)
    pub avx512bw: bool,
    /// AVX-512DQ dword/qword ops (x86_64)
    pub avx512dq: bool,
    /// AVX-512VL vector length extensions (x86_64)
    pub avx512vl: bool,
    /// NEON support (ARM) - 128-bit
    pub neon: bool,
}

impl CpuFeatures {
    /// Check if AVX-512 is fully supported (F + BW + DQ + VL)
    #[inline]
    pub const fn has_avx512_full(&self) -> bool {
        self.avx512f && self.avx512bw && self.avx512dq && self.avx512vl
    }

    /// Highest dispatch level this CPU supports
    #[inline]
    pub const fn best_level(&self) -> SimdLevel {
        if self.has_avx512_full() {
            SimdLevel::Simd512
        } else if self.avx2 {
            SimdLevel::Simd256
        } else if self.sse2 || self.neon {
            SimdLevel::Simd128
        } else {
            SimdLevel::Scalar
        }
    }
}

/// Detect available SIMD instruction sets
pub fn detect_cpu_features() -> CpuFeatures {
    #[cfg(target_arch = "x86_64")]
    {
        CpuFeatures {
            sse2: is_x86_feature_detected!("sse2"),
            sse4_1: is_x86_feature_detected!("sse4.1"),
            avx2: is_x86_feature_detected!("avx2"),
            avx512f: is_x86_feature_detected!("avx512f"),
            avx512bw: is_x86_feature_detected!("avx512bw"),
            avx512dq: is_x86_feature_detected!("avx512dq"),
            avx512vl: is_x86_feature_detected!("avx512vl"),
            neon: false,
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        CpuFeatures {
            sse2: false,
            sse4_1: false,
            avx2: false,
            avx512f: false,
            avx512bw: false,
            avx512dq: false,
            avx512vl: false,
            neon: std::arch::is_aarch64_feature_detected!("neon"),
        }
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        CpuFeatures {
            sse2: false,
            sse4_1: false,
            avx2: false,
            avx512f: false,
            avx512bw: false,
            avx512dq: false,
            avx512vl: false,
            neon: false,
        }
    }
}
